use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::konfirmo::new;
use anyhow::Result;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port } => {
            // Catch a malformed provider URL before serving traffic
            Url::parse(&globals.identity_url)?;

            new(port, globals).await?;
        }
    }

    Ok(())
}
