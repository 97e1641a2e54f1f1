//! Message flags.

/// A message flag.
///
/// `Recent` is only legal in FETCH data; `Any` (the `\*` token) is only legal
/// inside a `PERMANENTFLAGS` response code. [`Flag::Keyword`] holds a plain
/// atom keyword; [`Flag::Extension`] holds a backslash-prefixed system flag
/// this client does not otherwise know (the stored name excludes the
/// backslash).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Message has been answered.
    Answered,
    /// Message is flagged for special attention.
    Flagged,
    /// Message is marked for deletion.
    Deleted,
    /// Message has been read.
    Seen,
    /// Message is a draft.
    Draft,
    /// Message is recent (this is the first session to see it).
    Recent,
    /// The `\*` token: clients may use arbitrary keywords.
    Any,
    /// Custom keyword flag (no backslash).
    Keyword(String),
    /// Unknown system flag (stored without its leading backslash).
    Extension(String),
}

impl Flag {
    /// Parses a flag token, ASCII-case-insensitively for system flags.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s == "\\*" {
            return Self::Any;
        }
        match s.to_ascii_uppercase().as_str() {
            "\\ANSWERED" => Self::Answered,
            "\\FLAGGED" => Self::Flagged,
            "\\DELETED" => Self::Deleted,
            "\\SEEN" => Self::Seen,
            "\\DRAFT" => Self::Draft,
            "\\RECENT" => Self::Recent,
            _ => s.strip_prefix('\\').map_or_else(
                || Self::Keyword(s.to_string()),
                |name| Self::Extension(name.to_string()),
            ),
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Answered => write!(f, "\\Answered"),
            Self::Flagged => write!(f, "\\Flagged"),
            Self::Deleted => write!(f, "\\Deleted"),
            Self::Seen => write!(f, "\\Seen"),
            Self::Draft => write!(f, "\\Draft"),
            Self::Recent => write!(f, "\\Recent"),
            Self::Any => write!(f, "\\*"),
            Self::Keyword(s) => write!(f, "{s}"),
            Self::Extension(s) => write!(f, "\\{s}"),
        }
    }
}

/// An ordered collection of message flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    flags: Vec<Flag>,
}

impl Flags {
    /// Creates an empty flag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a flag set from a vector, preserving order.
    #[must_use]
    pub fn from_vec(flags: Vec<Flag>) -> Self {
        Self { flags }
    }

    /// Adds a flag if not already present.
    pub fn insert(&mut self, flag: Flag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }

    /// Removes a flag.
    pub fn remove(&mut self, flag: &Flag) {
        self.flags.retain(|f| f != flag);
    }

    /// Returns true if the flag is present.
    #[must_use]
    pub fn contains(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }

    /// Returns true if the message has been seen.
    #[must_use]
    pub fn is_seen(&self) -> bool {
        self.contains(&Flag::Seen)
    }

    /// Returns true if the message is marked for deletion.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.contains(&Flag::Deleted)
    }

    /// Returns an iterator over the flags in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    /// Returns the number of flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Returns true if there are no flags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl IntoIterator for Flags {
    type Item = Flag;
    type IntoIter = std::vec::IntoIter<Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.into_iter()
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_system_flags_case_insensitive() {
        assert_eq!(Flag::parse("\\Seen"), Flag::Seen);
        assert_eq!(Flag::parse("\\SEEN"), Flag::Seen);
        assert_eq!(Flag::parse("\\answered"), Flag::Answered);
    }

    #[test]
    fn parse_star_is_any() {
        assert_eq!(Flag::parse("\\*"), Flag::Any);
        assert_eq!(Flag::Any.to_string(), "\\*");
    }

    #[test]
    fn keyword_vs_extension() {
        assert_eq!(Flag::parse("$Forwarded"), Flag::Keyword("$Forwarded".to_string()));
        assert_eq!(Flag::parse("\\Unregistered"), Flag::Extension("Unregistered".to_string()));
        assert_eq!(
            Flag::Extension("Unregistered".to_string()).to_string(),
            "\\Unregistered"
        );
    }

    #[test]
    fn every_flag_round_trips() {
        let flags = [
            Flag::Answered,
            Flag::Flagged,
            Flag::Deleted,
            Flag::Seen,
            Flag::Draft,
            Flag::Recent,
            Flag::Any,
            Flag::Keyword("$MDNSent".to_string()),
            Flag::Extension("Junk".to_string()),
        ];
        for flag in flags {
            assert_eq!(Flag::parse(&flag.to_string()), flag);
        }
    }

    #[test]
    fn insert_deduplicates_preserving_order() {
        let mut flags = Flags::new();
        flags.insert(Flag::Seen);
        flags.insert(Flag::Flagged);
        flags.insert(Flag::Seen);
        let collected: Vec<_> = flags.iter().cloned().collect();
        assert_eq!(collected, vec![Flag::Seen, Flag::Flagged]);
    }
}
