//! HTTP session for db.netkeiba.com.
//!
//! One `Session` per run owns its cookie store, so the login cookie is only
//! visible to requests made through the same session.

use anyhow::{bail, Context, Result};
use reqwest::{redirect, Client, StatusCode};
use tracing::{debug, info};

/// Charset the site serves its pages in
const PAGE_CHARSET: &str = "euc-jp";

/// Authenticated (or anonymous) HTTP session
pub struct Session {
    client: Client,
}

impl Session {
    /// Create a session with an empty cookie store. Redirects are not followed.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Log in with the member form. A successful login answers with a redirect.
    pub async fn login(&self, login_url: &str, email: &str, password: &str) -> Result<()> {
        info!("Logging in to netkeiba.com as {}", email);

        let form = [
            ("login_id", email),
            ("pswd", password),
            ("pid", "login"),
            ("action", "auth"),
        ];

        let response = self
            .client
            .post(login_url)
            .form(&form)
            .send()
            .await
            .with_context(|| format!("Failed to send login request to {}", login_url))?;

        if response.status() != StatusCode::FOUND {
            bail!("Login failed, status code is {}", response.status());
        }

        info!("Logged in");
        Ok(())
    }

    /// GET a page and decode it to UTF-8
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("Sending request to {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if response.status() != StatusCode::OK {
            bail!("Request to {} failed, status code is {}", url, response.status());
        }

        response
            .text_with_charset(PAGE_CHARSET)
            .await
            .with_context(|| format!("Failed to read body of {}", url))
    }
}
