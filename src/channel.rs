use std::fmt;

/// Predefined channels.
///
/// Any string is a valid channel; these are the ones the logger has
/// shorthands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Application code.
    App,
    /// Database queries.
    Sql,
    /// Outbound API calls.
    Api,
    /// Incoming requests.
    Req,
    /// Outgoing responses.
    Resp,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::App,
        Channel::Sql,
        Channel::Api,
        Channel::Req,
        Channel::Resp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::App => "app",
            Channel::Sql => "sql",
            Channel::Api => "api",
            Channel::Req => "req",
            Channel::Resp => "resp",
        }
    }

    /// Look a predefined channel up by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Channel> {
        Channel::ALL
            .into_iter()
            .find(|channel| channel.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.as_str().to_string()
    }
}
