use reqwest::Client;

use crate::config::HttpSettings;

use super::error::InfraError;

pub fn user_agent() -> &'static str {
    concat!("remote-pager/", env!("CARGO_PKG_VERSION"))
}

/// Build the client used for template targets.
pub fn build_client(settings: &HttpSettings) -> Result<Client, InfraError> {
    let mut builder = Client::builder().user_agent(user_agent());
    if let Some(timeout) = settings.timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}
