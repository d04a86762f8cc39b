use std::sync::{Arc, Mutex};

use mailer::{Mailer, SmtpConfig, verification_email};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
};

/// Minimal SMTP responder: accepts one session and records every line the
/// client sends.
async fn spawn_smtp(reply_to_data: &'static [u8]) -> (u16, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let transcript = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&transcript);

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        let _ = write.write_all(b"220 localhost ESMTP\r\n").await;

        let mut in_data = false;
        while let Ok(Some(line)) = lines.next_line().await {
            log.lock().unwrap().push(line.clone());
            let reply: &[u8] = if in_data {
                if line != "." {
                    continue;
                }
                in_data = false;
                reply_to_data
            } else if line.starts_with("EHLO") {
                b"250 localhost\r\n"
            } else if line.starts_with("DATA") {
                in_data = true;
                b"354 end with <CRLF>.<CRLF>\r\n"
            } else if line.starts_with("QUIT") {
                let _ = write.write_all(b"221 bye\r\n").await;
                break;
            } else {
                b"250 ok\r\n"
            };
            if write.write_all(reply).await.is_err() {
                break;
            }
        }
    });

    (port, transcript)
}

fn plain_config(port: u16) -> SmtpConfig {
    SmtpConfig {
        host: "127.0.0.1".to_string(),
        port,
        tls: false,
        credentials: None,
    }
}

#[tokio::test]
async fn smtp_delivers_html_message() {
    let (port, transcript) = spawn_smtp(b"250 queued\r\n").await;
    let mailer = Mailer::smtp(plain_config(port), "noreply@ledgerly.test").unwrap();

    let email = verification_email("ann@example.com", "https://site/verify?token=abc");
    mailer.send_verification_email(&email).await.unwrap();

    let lines = transcript.lock().unwrap().clone();
    assert!(lines.iter().any(|l| l.starts_with("MAIL FROM:<noreply@ledgerly.test>")));
    assert!(lines.iter().any(|l| l.starts_with("RCPT TO:<ann@example.com>")));
    assert!(lines.iter().any(|l| l == "Subject: Verify your email address"));
    assert!(lines.iter().any(|l| l.starts_with("Content-Type: text/html")));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn smtp_rejection_propagates() {
    let (port, _transcript) = spawn_smtp(b"554 rejected\r\n").await;
    let mailer = Mailer::smtp(plain_config(port), "noreply@ledgerly.test").unwrap();

    let email = verification_email("ann@example.com", "https://site/verify?token=abc");
    let err = mailer.send_verification_email(&email).await.unwrap_err();
    assert!(matches!(err, mailer::MailError::Smtp(_)));
}

#[tokio::test]
async fn smtp_rejects_invalid_recipient() {
    let mailer = Mailer::smtp(plain_config(1), "noreply@ledgerly.test").unwrap();
    let email = verification_email("not an address", "https://site/verify?token=abc");
    let err = mailer.send_verification_email(&email).await.unwrap_err();
    assert!(matches!(err, mailer::MailError::Address(_)));
}
