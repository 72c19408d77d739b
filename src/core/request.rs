//! Parsing of chat command text into requests.

use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid URL pattern"));

/// A slash command split into its lowercased name and raw arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: String,
}

/// Split `/name@bot rest of text` into `("name", "rest of text")`.
///
/// Returns `None` for text that is not a command.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let text = text.trim();
    let body = text.strip_prefix('/')?;
    let (head, args) = match body.find(char::is_whitespace) {
        Some(idx) => (&body[..idx], body[idx..].trim()),
        None => (body, ""),
    };
    let name = head.split('@').next().unwrap_or("").to_lowercase();
    if name.is_empty() {
        return None;
    }
    Some(ParsedCommand {
        name,
        args: args.to_string(),
    })
}

/// Commands that route to the play handler.
pub const PLAY_COMMANDS: [&str; 5] = ["play", "vplay", "playforce", "cplay", "cplayforce"];

/// A playback request built from one incoming message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackRequest {
    pub command: String,
    /// Free text after the command, if any.
    pub query: Option<String>,
    /// First http(s) link in the arguments.
    pub url: Option<String>,
    pub video: bool,
    pub force: bool,
    pub channel: bool,
}

impl PlaybackRequest {
    pub fn from_command(cmd: &ParsedCommand) -> Self {
        let name = cmd.name.as_str();
        let query = if cmd.args.is_empty() {
            None
        } else {
            Some(cmd.args.clone())
        };
        Self {
            command: cmd.name.clone(),
            url: extract_url(&cmd.args),
            query,
            video: name == "vplay",
            force: name.ends_with("force"),
            channel: name.starts_with('c'),
        }
    }
}

/// First http(s) link in `text`.
pub fn extract_url(text: &str) -> Option<String> {
    URL_RE.find(text).map(|m| m.as_str().to_string())
}

/// Reference to a channel given to `/channelplay`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelRef {
    Id(i64),
    /// `@username`, always stored with the leading `@`.
    Username(String),
}

impl ChannelRef {
    /// `t.me/+hash` and `t.me/joinchat/hash` links, which name no chat the
    /// bot can look up.
    pub fn is_invite_link(input: &str) -> bool {
        let link = input
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let rest = link
            .strip_prefix("t.me/")
            .or_else(|| link.strip_prefix("telegram.me/"));
        matches!(rest, Some(r) if r.starts_with('+') || r.starts_with("joinchat/"))
    }

    /// Accepts `-100123`, `@name`, `name`, `t.me/name` and `https://t.me/name`.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let digits = input.strip_prefix('-').unwrap_or(input);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = input.parse::<i64>() {
                return ChannelRef::Id(id);
            }
        }

        let link = input
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let name = link
            .strip_prefix("t.me/")
            .or_else(|| link.strip_prefix("telegram.me/"))
            .map(|rest| rest.split(['/', '?']).next().unwrap_or(rest))
            .unwrap_or(link);
        let name = name.trim_start_matches('@');
        ChannelRef::Username(format!("@{}", name))
    }
}

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelRef::Id(id) => write!(f, "{}", id),
            ChannelRef::Username(name) => write!(f, "{}", name),
        }
    }
}
