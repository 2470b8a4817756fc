use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::config::AppConfig;

pub fn handle(
    config: &AppConfig,
    sub: String,
    email: Option<String>,
    role: Option<String>,
    hours: Option<u64>,
    as_json: bool,
) -> anyhow::Result<()> {
    let hours = hours.unwrap_or(config.auth.jwt_expiry_hours);
    let claims = Claims::new(sub, email, role, hours);
    let token = generate_jwt(&claims, &config.auth.jwt_secret)?;

    if as_json {
        let output = json!({ "success": true, "data": { "token": token, "expires_at": claims.exp } });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", token);
    }
    Ok(())
}
