//! # Query Commands
//!
//! Grammar of the line-oriented query protocol.
//!
//! ```text
//! GET /last
//! GET /avg/day/<YYYY-MM-DD>
//! GET /avg/week/<YYYY-Www>
//! GET /avg/month/<YYYY-MM>
//! GET /all/day/<YYYY-MM-DD>
//! GET /all/week
//! GET /all/month
//! GET /last/days/<n>
//! ```

/// Request method prefix shared by every command
const METHOD_PREFIX: &str = "GET ";

/// One parsed request line
///
/// Arguments are kept as received; the dispatcher validates them so that a
/// bad argument can be answered with a readable sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Last sample line of today's partition
    Last,

    /// `AVG:` line of one day partition
    AvgDay(String),

    /// Weekly aggregate matching a label
    AvgWeek(String),

    /// Monthly aggregate matching a label
    AvgMonth(String),

    /// Every sample line of one day partition
    AllDay(String),

    /// Every weekly aggregate
    AllWeek,

    /// Every monthly aggregate
    AllMonth,

    /// Daily aggregates of the last `n` days
    LastDays(String),

    /// Anything outside the grammar
    Unknown(String),
}

impl Command {
    /// Parse one request line
    ///
    /// Surrounding whitespace is ignored. Returns `None` for an empty line,
    /// which gets no response at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use greenhouse_logger::query::Command;
    ///
    /// assert_eq!(Command::parse("GET /last\r\n"), Some(Command::Last));
    /// assert_eq!(
    ///     Command::parse("GET /avg/day/2025-06-26"),
    ///     Some(Command::AvgDay("2025-06-26".to_string()))
    /// );
    /// assert_eq!(Command::parse("   "), None);
    /// ```
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let Some(path) = line.strip_prefix(METHOD_PREFIX).map(str::trim) else {
            return Some(Command::Unknown(line.to_string()));
        };

        let command = match path {
            "/last" => Command::Last,
            "/all/week" => Command::AllWeek,
            "/all/month" => Command::AllMonth,
            _ => {
                let argument = |prefix: &str| path.strip_prefix(prefix).map(|arg| arg.trim().to_string());

                if let Some(date) = argument("/avg/day/") {
                    Command::AvgDay(date)
                } else if let Some(label) = argument("/avg/week/") {
                    Command::AvgWeek(label)
                } else if let Some(label) = argument("/avg/month/") {
                    Command::AvgMonth(label)
                } else if let Some(date) = argument("/all/day/") {
                    Command::AllDay(date)
                } else if let Some(count) = argument("/last/days/") {
                    Command::LastDays(count)
                } else {
                    Command::Unknown(line.to_string())
                }
            }
        };

        Some(command)
    }
}
