//! Message and context builders for automatically logged events.
//!
//! The hooks that capture queries and HTTP calls live in the host
//! application; they describe what happened with [`SqlQuery`] or
//! [`ApiCall`] and hand it to [`QLogger::log_sql`] / [`QLogger::log_api`].
//!
//! [`QLogger::log_sql`]: crate::logger::QLogger::log_sql
//! [`QLogger::log_api`]: crate::logger::QLogger::log_api

use serde_json::Value;

use crate::record::Fields;

/// An executed database query.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    /// Connection the query ran on.
    pub connection: String,
    /// Query text with `?` placeholders.
    pub sql: String,
    pub bindings: Vec<Value>,
    pub elapsed_ms: f64,
}

impl SqlQuery {
    /// `query <connection> => <sql with bindings inlined> ( <ms> ms )`
    pub fn message(&self) -> String {
        format!(
            "query {} => {} ( {} ms )",
            self.connection,
            self.interpolated(),
            self.elapsed_ms
        )
    }

    /// The query text with every `?` replaced by its quoted binding.
    pub fn interpolated(&self) -> String {
        let mut bindings = self.bindings.iter();
        let mut out = String::with_capacity(self.sql.len());
        for c in self.sql.chars() {
            if c == '?' {
                out.push('\'');
                out.push_str(&binding_text(bindings.next()));
                out.push('\'');
            } else {
                out.push(c);
            }
        }
        out
    }
}

fn binding_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::Bool(true)) => "1".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// How an outbound call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    Response { status: u16, body: String },
    Failure { message: String },
}

/// An outbound HTTP call made by the application.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub method: String,
    pub host: String,
    pub path: String,
    /// Query parameters for `GET`, form body otherwise.
    pub params: Fields,
    pub headers: Vec<(String, Vec<String>)>,
    pub cookies: Vec<Value>,
    pub outcome: ApiOutcome,
}

impl ApiCall {
    pub fn failed(&self) -> bool {
        matches!(self.outcome, ApiOutcome::Failure { .. })
    }

    /// `api call to <host><path>`
    pub fn message(&self) -> String {
        format!("api call to {}{}", self.host, self.path)
    }

    /// Context object: `method`, `params`, `cookies`, `headers`, `status`
    /// and `response`. A failed call is recorded as status 500 with the
    /// failure message as response; a response body that is not JSON is
    /// recorded as `null`.
    pub fn context(&self) -> Fields {
        let headers: Fields = self
            .headers
            .iter()
            .map(|(name, values)| (name.clone(), Value::String(values.join(","))))
            .collect();

        let (status, response) = match &self.outcome {
            ApiOutcome::Response { status, body } => (
                *status,
                serde_json::from_str(body).unwrap_or(Value::Null),
            ),
            ApiOutcome::Failure { message } => (500, Value::String(message.clone())),
        };

        let mut context = Fields::new();
        context.insert("method".to_string(), Value::String(self.method.clone()));
        context.insert("params".to_string(), Value::Object(self.params.clone()));
        context.insert("cookies".to_string(), Value::Array(self.cookies.clone()));
        context.insert("headers".to_string(), Value::Object(headers));
        context.insert("status".to_string(), Value::from(status));
        context.insert("response".to_string(), response);
        context
    }

    /// Parse a URL query string or form body (`a=1&b=two+words`) into
    /// parameters. Later duplicates win.
    pub fn parse_params(encoded: &str) -> Fields {
        encoded
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                let name = decode_component(name)?;
                let value = decode_component(value)?;
                Some((name, Value::String(value)))
            })
            .collect()
    }
}

fn decode_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}
