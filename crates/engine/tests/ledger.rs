use chrono::NaiveDate;
use uuid::Uuid;

use engine::{EngineError, EntryFilter, EntryInput, LedgerKind, Money};

mod common;
use common::{engine_with_db, exec};

fn input(date: &str, amount: f64, category_id: Uuid) -> EntryInput {
    EntryInput {
        date: date.to_string(),
        amount,
        category_id,
        note: None,
    }
}

#[tokio::test]
async fn expense_lifecycle_keeps_budget_in_sync() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", Some(Money::new(50_000)))
        .await
        .unwrap();
    assert_eq!(engine.budget(food.id).await.unwrap().current_amount, Money::ZERO);

    let lunch = engine
        .create_entry(LedgerKind::Expense, &input("2024-05-01", 12.5, food.id))
        .await
        .unwrap();
    let dinner = engine
        .create_entry(LedgerKind::Expense, &input("2024-05-02", 30.0, food.id))
        .await
        .unwrap();
    assert_eq!(
        engine.budget(food.id).await.unwrap().current_amount,
        Money::new(4_250)
    );

    engine
        .update_entry(LedgerKind::Expense, lunch.id, &input("2024-05-01", 20.0, food.id))
        .await
        .unwrap();
    assert_eq!(
        engine.budget(food.id).await.unwrap().current_amount,
        Money::new(5_000)
    );

    engine
        .delete_entry(LedgerKind::Expense, dinner.id)
        .await
        .unwrap();
    assert_eq!(
        engine.budget(food.id).await.unwrap().current_amount,
        Money::new(2_000)
    );

    let drifts = engine.verify_budgets().await.unwrap();
    assert!(drifts.iter().all(|drift| drift.is_consistent()));
}

#[tokio::test]
async fn moving_an_expense_between_categories_transfers_the_amount() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", None)
        .await
        .unwrap();
    let rent = engine
        .create_category(LedgerKind::Expense, "Rent", None)
        .await
        .unwrap();

    let entry = engine
        .create_entry(LedgerKind::Expense, &input("2024-05-01", 100.0, food.id))
        .await
        .unwrap();
    let moved = engine
        .update_entry(LedgerKind::Expense, entry.id, &input("2024-05-01", 80.0, rent.id))
        .await
        .unwrap();
    assert_eq!(moved.category_id, rent.id);
    assert_eq!(moved.created_at, entry.created_at);

    assert_eq!(engine.budget(food.id).await.unwrap().current_amount, Money::ZERO);
    assert_eq!(
        engine.budget(rent.id).await.unwrap().current_amount,
        Money::new(8_000)
    );
}

#[tokio::test]
async fn invalid_amounts_leave_budget_untouched() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", None)
        .await
        .unwrap();
    engine
        .create_entry(LedgerKind::Expense, &input("2024-05-01", 10.0, food.id))
        .await
        .unwrap();

    for amount in [-1.0, f64::NAN, f64::INFINITY] {
        let err = engine
            .create_entry(LedgerKind::Expense, &input("2024-05-01", amount, food.id))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    assert_eq!(
        engine.budget(food.id).await.unwrap().current_amount,
        Money::new(1_000)
    );
}

#[tokio::test]
async fn missing_entries_and_categories_are_not_found() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", None)
        .await
        .unwrap();
    engine
        .create_entry(LedgerKind::Expense, &input("2024-05-01", 10.0, food.id))
        .await
        .unwrap();

    let err = engine
        .delete_entry(LedgerKind::Expense, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .update_entry(
            LedgerKind::Expense,
            Uuid::new_v4(),
            &input("2024-05-01", 5.0, food.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .create_entry(
            LedgerKind::Expense,
            &input("2024-05-01", 5.0, Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    assert_eq!(
        engine.budget(food.id).await.unwrap().current_amount,
        Money::new(1_000)
    );
}

#[tokio::test]
async fn income_entries_do_not_touch_budgets() {
    let (engine, _db) = engine_with_db().await;
    let salary = engine
        .create_category(LedgerKind::Income, "Salary", None)
        .await
        .unwrap();
    engine
        .create_entry(LedgerKind::Income, &input("2024-05-01", 2_500.0, salary.id))
        .await
        .unwrap();

    assert!(engine.budgets().await.unwrap().is_empty());
    let err = engine.budget(salary.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let totals = engine.ledger_totals().await.unwrap();
    assert!(totals.contains(&(LedgerKind::Income, Money::new(250_000))));
    assert!(totals.contains(&(LedgerKind::Expense, Money::ZERO)));
}

#[tokio::test]
async fn listing_is_newest_first_and_paginates() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", None)
        .await
        .unwrap();
    let rent = engine
        .create_category(LedgerKind::Expense, "Rent", None)
        .await
        .unwrap();

    for day in 1..=5 {
        let date = format!("2024-05-0{day}");
        engine
            .create_entry(LedgerKind::Expense, &input(&date, day as f64, food.id))
            .await
            .unwrap();
    }
    engine
        .create_entry(LedgerKind::Expense, &input("2024-05-03", 99.0, rent.id))
        .await
        .unwrap();

    let first = engine
        .list_entries(LedgerKind::Expense, &EntryFilter::default(), 4, None)
        .await
        .unwrap();
    assert_eq!(first.entries.len(), 4);
    assert!(first.next_cursor.is_some());
    let dates: Vec<_> = first.entries.iter().map(|e| e.date).collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);

    let second = engine
        .list_entries(
            LedgerKind::Expense,
            &EntryFilter::default(),
            4,
            first.next_cursor.as_deref(),
        )
        .await
        .unwrap();
    assert_eq!(second.entries.len(), 2);
    assert!(second.next_cursor.is_none());
    assert_eq!(
        second.entries.last().map(|e| e.date),
        NaiveDate::from_ymd_opt(2024, 5, 1)
    );

    let filtered = engine
        .list_entries(
            LedgerKind::Expense,
            &EntryFilter {
                category_id: Some(food.id),
                from: NaiveDate::from_ymd_opt(2024, 5, 2),
                to: NaiveDate::from_ymd_opt(2024, 5, 4),
            },
            50,
            None,
        )
        .await
        .unwrap();
    assert_eq!(filtered.entries.len(), 3);
    assert!(filtered.entries.iter().all(|e| e.category_id == food.id));
}

#[tokio::test]
async fn listing_with_unknown_category_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .list_entries(
            LedgerKind::Invest,
            &EntryFilter {
                category_id: Some(Uuid::new_v4()),
                ..EntryFilter::default()
            },
            10,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .list_entries(LedgerKind::Invest, &EntryFilter::default(), 10, Some("garbage"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn adjust_budget_applies_signed_deltas() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", None)
        .await
        .unwrap();

    let budget = engine
        .adjust_budget_current_amount(food.id, Money::new(700))
        .await
        .unwrap();
    assert_eq!(budget.current_amount, Money::new(700));
    let budget = engine
        .adjust_budget_current_amount(food.id, Money::new(-200))
        .await
        .unwrap();
    assert_eq!(budget.current_amount, Money::new(500));

    let err = engine
        .adjust_budget_current_amount(Uuid::new_v4(), Money::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn oversized_amounts_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", None)
        .await
        .unwrap();

    let err = engine
        .create_entry(LedgerKind::Expense, &input("2024-05-01", 5e16, food.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    engine
        .create_entry(LedgerKind::Expense, &input("2024-05-01", 1e13, food.id))
        .await
        .unwrap();
    assert_eq!(
        engine.budget(food.id).await.unwrap().current_amount,
        Money::MAX_INPUT
    );
}

#[tokio::test]
async fn budget_overflow_rolls_back_the_entry() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", None)
        .await
        .unwrap();
    engine
        .adjust_budget_current_amount(food.id, Money::new(i64::MAX - 100))
        .await
        .unwrap();

    engine
        .create_entry(LedgerKind::Expense, &input("2024-05-01", 1.0, food.id))
        .await
        .unwrap();
    let err = engine
        .create_entry(LedgerKind::Expense, &input("2024-05-02", 2.0, food.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    assert_eq!(
        engine.budget(food.id).await.unwrap().current_amount,
        Money::new(i64::MAX)
    );
    let page = engine
        .list_entries(LedgerKind::Expense, &EntryFilter::default(), 10, None)
        .await
        .unwrap();
    assert_eq!(page.entries.len(), 1);

    let err = engine
        .adjust_budget_current_amount(food.id, Money::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(engine.verify_budgets().await.unwrap().len(), 1);
    assert_eq!(engine.recompute_budgets().await.unwrap().len(), 1);
    assert_eq!(
        engine.budget(food.id).await.unwrap().current_amount,
        Money::new(100)
    );
}

#[tokio::test]
async fn ledger_totals_out_of_range_are_reported() {
    let (engine, db) = engine_with_db().await;
    for name in ["Salary", "Bonus"] {
        let category = engine
            .create_category(LedgerKind::Income, name, None)
            .await
            .unwrap();
        exec(
            &db,
            "INSERT INTO incomes (id, date, amount_minor, category_id, note, created_at) \
             VALUES (?, ?, ?, ?, NULL, ?)",
            vec![
                Uuid::new_v4().to_string().into(),
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().into(),
                (i64::MAX / 2 + 1).into(),
                category.id.to_string().into(),
                chrono::Utc::now().into(),
            ],
        )
        .await;
    }

    let err = engine.ledger_totals().await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn recompute_repairs_drifted_budgets() {
    let (engine, db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", None)
        .await
        .unwrap();
    engine
        .create_entry(LedgerKind::Expense, &input("2024-05-01", 42.0, food.id))
        .await
        .unwrap();

    exec(
        &db,
        "UPDATE budgets SET current_amount_minor = ? WHERE category_id = ?",
        vec![999_i64.into(), food.id.to_string().into()],
    )
    .await;

    let drifts = engine.verify_budgets().await.unwrap();
    assert_eq!(drifts.len(), 1);
    assert!(!drifts[0].is_consistent());
    assert_eq!(drifts[0].stored, Some(Money::new(999)));
    assert_eq!(drifts[0].expected, Money::new(4_200));

    let repaired = engine.recompute_budgets().await.unwrap();
    assert_eq!(repaired.len(), 1);
    assert_eq!(
        engine.budget(food.id).await.unwrap().current_amount,
        Money::new(4_200)
    );
    assert!(engine.recompute_budgets().await.unwrap().is_empty());
}

#[tokio::test]
async fn budget_overview_reports_remaining_and_overruns() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", Some(Money::new(1_000)))
        .await
        .unwrap();
    engine
        .create_category(LedgerKind::Expense, "Books", None)
        .await
        .unwrap();
    engine
        .create_entry(LedgerKind::Expense, &input("2024-05-01", 15.0, food.id))
        .await
        .unwrap();

    let overview = engine.budgets().await.unwrap();
    assert_eq!(overview.len(), 2);
    assert_eq!(overview[0].category, "Books");
    assert_eq!(overview[0].remaining(), Ok(None));
    assert_eq!(overview[1].category, "Food");
    assert_eq!(overview[1].remaining(), Ok(Some(Money::new(-500))));
    assert!(overview[1].over_limit());
}

#[tokio::test]
async fn categories_are_unique_and_protected_while_in_use() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "  Food  ", None)
        .await
        .unwrap();
    assert_eq!(food.name, "Food");

    let err = engine
        .create_category(LedgerKind::Expense, "FOOD", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // Same name in another ledger is fine.
    engine
        .create_category(LedgerKind::Income, "Food", None)
        .await
        .unwrap();

    let entry = engine
        .create_entry(LedgerKind::Expense, &input("2024-05-01", 1.0, food.id))
        .await
        .unwrap();
    let err = engine
        .delete_category(LedgerKind::Expense, food.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine
        .delete_entry(LedgerKind::Expense, entry.id)
        .await
        .unwrap();
    engine
        .delete_category(LedgerKind::Expense, food.id)
        .await
        .unwrap();
    assert!(engine.budgets().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_category_renames_and_patches_limit() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", Some(Money::new(100)))
        .await
        .unwrap();
    engine
        .create_category(LedgerKind::Expense, "Rent", None)
        .await
        .unwrap();

    let renamed = engine
        .update_category(LedgerKind::Expense, food.id, Some("Groceries"), None)
        .await
        .unwrap();
    assert_eq!(renamed.name, "Groceries");
    assert_eq!(renamed.budget_limit, Some(Money::new(100)));

    let cleared = engine
        .update_category(LedgerKind::Expense, food.id, None, Some(None))
        .await
        .unwrap();
    assert_eq!(cleared.budget_limit, None);

    let err = engine
        .update_category(LedgerKind::Expense, food.id, Some("rent"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn export_writes_every_matching_entry() {
    let (engine, _db) = engine_with_db().await;
    let food = engine
        .create_category(LedgerKind::Expense, "Food", None)
        .await
        .unwrap();
    engine
        .create_entry(
            LedgerKind::Expense,
            &EntryInput {
                note: Some("weekly shop".to_string()),
                ..input("2024-05-01", 1_234.5, food.id)
            },
        )
        .await
        .unwrap();

    let csv = engine
        .export_entries(LedgerKind::Expense, &EntryFilter::default())
        .await
        .unwrap();
    let text = String::from_utf8(csv).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("date,category,amount,note"));
    assert_eq!(lines.next(), Some("2024-05-01,Food,\"1,234.50\",weekly shop"));
    assert_eq!(lines.next(), None);
}
