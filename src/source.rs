//! Remote task source.
//!
//! [`TaskSource`] is the seam between the pipeline and the network: it returns the
//! raw task records of one list and nothing else. [`ClickUpSource`] is the HTTP
//! implementation against the ClickUp v2 API.

use reqwest::blocking::{Client, Response};
use reqwest::header::AUTHORIZATION;
use serde_json::Value;

use crate::config::Config;
use crate::error::{DashError, FetchError};

/// Anything that can produce the raw task records of the configured list.
pub trait TaskSource {
    fn fetch_tasks(&self) -> Result<Vec<Value>, FetchError>;
}

/// Fetches non-archived tasks of one ClickUp list.
pub struct ClickUpSource {
    http: Client,
    token: String,
    url_tasks: String,
}

impl ClickUpSource {
    pub fn new(config: &Config) -> Result<Self, DashError> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| DashError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            token: config.token.clone(),
            url_tasks: config.tasks_url(),
        })
    }
}

impl TaskSource for ClickUpSource {
    fn fetch_tasks(&self) -> Result<Vec<Value>, FetchError> {
        let url = &self.url_tasks;
        tracing::debug!(target: "sdash.source", stage = "fetch.in", url = %url);

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, &self.token)
            .query(&[("archived", "false")])
            .send()
            .map_err(|err| FetchError::from_reqwest(err, url.clone()))?;
        let status = resp.status();
        let tasks = parse_tasks_response(resp)?;

        tracing::debug!(
            target: "sdash.source",
            stage = "fetch.out",
            status = %status,
            tasks = tasks.len()
        );
        Ok(tasks)
    }
}

fn parse_tasks_response(resp: Response) -> Result<Vec<Value>, FetchError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp
        .text()
        .map_err(|err| FetchError::from_reqwest(err, url.clone()))?;

    if !status.is_success() {
        return Err(FetchError::status_error(status.as_u16(), url, &body));
    }

    let mut value: Value = serde_json::from_str(&body)
        .map_err(|err| FetchError::decode_error(status.as_u16(), url.clone(), err, &body))?;

    match value.get_mut("tasks").map(Value::take) {
        Some(Value::Array(tasks)) => Ok(tasks),
        Some(_) => Err(FetchError::shape_error(
            status.as_u16(),
            url,
            "\"tasks\" is not an array",
        )),
        None => Err(FetchError::shape_error(
            status.as_u16(),
            url,
            "response has no \"tasks\" field",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn config_for(server: &Server) -> Config {
        Config {
            token: "pk_test".to_string(),
            list_id: "901".to_string(),
            api_base: server.url(),
            cache_ttl: Duration::from_secs(60),
            http_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_fetch_sends_token_and_archived_filter() {
        let mut server = Server::new();
        let m = server
            .mock("GET", "/list/901/task")
            .match_header("authorization", "pk_test")
            .match_query(Matcher::UrlEncoded("archived".into(), "false".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"tasks":[{"id":"a"},{"id":"b"}]}"#)
            .create();

        let source = ClickUpSource::new(&config_for(&server)).unwrap();
        let tasks = source.fetch_tasks().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0]["id"], "a");
        m.assert();
    }

    #[test]
    fn test_fetch_status_error() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/list/901/task")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"err":"Token invalid","ECODE":"OAUTH_025"}"#)
            .create();

        let source = ClickUpSource::new(&config_for(&server)).unwrap();
        let err = source.fetch_tasks().unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Status);
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("Token invalid"));
    }

    #[test]
    fn test_fetch_malformed_json() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/list/901/task")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create();

        let source = ClickUpSource::new(&config_for(&server)).unwrap();
        let err = source.fetch_tasks().unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Decode);
    }

    #[test]
    fn test_fetch_missing_tasks_field() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/list/901/task")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"items":[]}"#)
            .create();

        let source = ClickUpSource::new(&config_for(&server)).unwrap();
        let err = source.fetch_tasks().unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Decode);
        assert!(err.to_string().contains("no \"tasks\" field"));
    }

    #[test]
    fn test_fetch_connect_error() {
        let config = Config {
            token: "pk".into(),
            list_id: "1".into(),
            api_base: "http://127.0.0.1:1".into(),
            cache_ttl: Duration::from_secs(60),
            http_timeout: Duration::from_secs(2),
        };
        let source = ClickUpSource::new(&config).unwrap();
        let err = source.fetch_tasks().unwrap_err();
        assert!(err.url().unwrap().contains("/list/1/task"));
    }
}
