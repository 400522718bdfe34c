use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use clap::Args;
use rand::Rng;

#[derive(Args)]
pub struct SecretsCommand {}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill(&mut bytes[..]);
    bytes
}

/// Unpadded URL-safe base64 of `nbytes` random bytes
fn token_urlsafe(nbytes: usize) -> String {
    URL_SAFE_NO_PAD.encode(random_bytes(nbytes))
}

/// 32 random bytes, padded URL-safe base64, as Fernet expects
fn fernet_key() -> String {
    URL_SAFE.encode(random_bytes(32))
}

fn generate() -> Vec<(&'static str, String)> {
    vec![
        ("AIRFLOW_FERNET_KEY", fernet_key()),
        ("AIRFLOW_SECRET_KEY", token_urlsafe(32)),
        ("JWT_SECRET_KEY", token_urlsafe(32)),
        ("POSTGRES_PASSWORD", token_urlsafe(16)),
        ("REDIS_PASSWORD", token_urlsafe(16)),
        ("GRAFANA_ADMIN_PASSWORD", token_urlsafe(12)),
    ]
}

impl SecretsCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        // Plain KEY=value lines so the output can be appended to a .env file
        for (key, value) in generate() {
            println!("{}={}", key, value);
        }
        Ok(())
    }
}
