use std::path::Path;

use anyhow::Result;
use serde_json::Value;
use serde_json::json;
use wiremock::MockServer;

mod prospects;
mod search;

pub(crate) const ACCESS_TOKEN: &str = "cli-access";
pub(crate) const REFRESH_TOKEN: &str = "cli-refresh";

pub(crate) fn prospector_command(home: &Path, server: &MockServer) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("prospector")?;
    cmd.env("PROSPECTOR_HOME", home)
        .env("PROSPECTOR_API_URL", server.uri())
        .env_remove("PROSPECTOR_PASSWORD")
        .env_remove("RUST_LOG");
    Ok(cmd)
}

pub(crate) fn write_session(home: &Path) -> Result<()> {
    std::fs::write(
        home.join("auth.json"),
        json!({ "access_token": ACCESS_TOKEN, "refresh_token": REFRESH_TOKEN }).to_string(),
    )?;
    Ok(())
}

pub(crate) fn read_session(home: &Path) -> Result<Option<Value>> {
    let path = home.join("auth.json");
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&std::fs::read_to_string(path)?)?))
}
