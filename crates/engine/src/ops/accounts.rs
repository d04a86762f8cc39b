use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Claims, EngineError, Registration, ResultEngine, Session, User,
    accounts::{sessions, users},
    util::{hash_password, normalize_email, parse_uuid},
};

use super::{Engine, with_tx};

const MIN_PASSWORD_LEN: usize = 8;

fn new_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

impl TryFrom<users::Model> for User {
    type Error = EngineError;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "user")?,
            email: model.email,
            verified: model.verified,
            created_at: model.created_at,
        })
    }
}

impl Engine {
    /// Creates an unverified account and returns the token to embed in the
    /// verification email.
    pub async fn register(&self, email: &str, password: &str) -> ResultEngine<Registration> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(EngineError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        with_tx!(self, |db_tx| {
            let existing = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(email));
            }

            let salt = Uuid::new_v4().simple().to_string();
            let verification_token = new_token();
            let model = users::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                email: ActiveValue::Set(email.clone()),
                password_hash: ActiveValue::Set(hash_password(&salt, password)),
                salt: ActiveValue::Set(salt),
                verified: ActiveValue::Set(false),
                verification_token: ActiveValue::Set(Some(verification_token.clone())),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!("registered user {email}");
            Ok(Registration {
                user: User::try_from(model)?,
                verification_token,
            })
        })
    }

    /// Deletes an account that has not been verified yet, so the address
    /// can register again. Verified accounts are left alone.
    pub async fn discard_registration(&self, user_id: Uuid) -> ResultEngine<()> {
        let res = users::Entity::delete_many()
            .filter(users::Column::Id.eq(user_id.to_string()))
            .filter(users::Column::Verified.eq(false))
            .exec(&self.database)
            .await?;
        if res.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("unverified user {user_id}")));
        }

        tracing::info!("discarded registration of user {user_id}");
        Ok(())
    }

    /// Marks the account owning `token` as verified.
    pub async fn verify_email(&self, token: &str) -> ResultEngine<User> {
        let model = users::Entity::find()
            .filter(users::Column::VerificationToken.eq(token))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("verification token".to_string()))?;

        let mut active: users::ActiveModel = model.into();
        active.verified = ActiveValue::Set(true);
        active.verification_token = ActiveValue::Set(None);
        let model = active.update(&self.database).await?;

        User::try_from(model)
    }

    /// Checks credentials and opens a new session.
    pub async fn login(&self, email: &str, password: &str) -> ResultEngine<Session> {
        let invalid = || EngineError::Unauthorized("invalid credentials".to_string());
        let email = normalize_email(email).map_err(|_| invalid())?;

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .ok_or_else(invalid)?;
        if hash_password(&user.salt, password) != user.password_hash {
            return Err(invalid());
        }
        if !user.verified {
            return Err(EngineError::Unauthorized("email not verified".to_string()));
        }

        let session = Session {
            token: new_token(),
            user_id: parse_uuid(&user.id, "user")?,
            expires_at: Utc::now() + self.session_ttl,
        };
        sessions::ActiveModel {
            token: ActiveValue::Set(session.token.clone()),
            user_id: ActiveValue::Set(user.id),
            expires_at: ActiveValue::Set(session.expires_at),
        }
        .insert(&self.database)
        .await?;

        Ok(session)
    }

    /// Drops a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> ResultEngine<()> {
        sessions::Entity::delete_by_id(token.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Resolves a session token into claims. Unknown or expired tokens yield
    /// `None`; expired sessions are removed on the way.
    pub async fn verify_session(&self, token: &str) -> ResultEngine<Option<Claims>> {
        let Some((session, user)) = sessions::Entity::find_by_id(token.to_string())
            .find_also_related(users::Entity)
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };

        if session.expires_at <= Utc::now() {
            tracing::debug!("session for user {} expired", session.user_id);
            self.logout(&session.token).await?;
            return Ok(None);
        }

        let Some(user) = user else {
            return Ok(None);
        };

        Ok(Some(Claims {
            user_id: parse_uuid(&user.id, "user")?,
            email: user.email,
            expires_at: session.expires_at,
        }))
    }
}
