//! Synchronous standby configuration of a primary.
//!
//! Accepted forms:
//! ```text
//! s1, s2
//! 2 (s1, s2, s3)
//! FIRST 1 (s1, "Mixed Case")
//! ANY 2 (s1, s2, s3)
//! *
//! ```
//! Every listed name is a synchronous candidate. Unquoted names compare
//! case-insensitively; quoted names compare exactly.

#[derive(Debug, Clone, PartialEq, Eq)]
struct StandbyName {
    name: String,
    quoted: bool,
}

impl StandbyName {
    fn matches(&self, candidate: &str) -> bool {
        if self.quoted {
            self.name == candidate
        } else {
            self.name == "*" || self.name.eq_ignore_ascii_case(candidate)
        }
    }
}

/// Ordered list of standby names the primary treats as synchronous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationConfig {
    members: Vec<StandbyName>,
}

impl ReplicationConfig {
    pub fn parse(raw: &str) -> Self {
        let list = strip_method(raw.trim());
        Self {
            members: split_names(list),
        }
    }

    pub fn is_synchronous(&self, standby: &str) -> bool {
        self.members.iter().any(|m| m.matches(standby))
    }
}

/// Drop an optional `FIRST n (` / `ANY n (` / `n (` prefix and closing paren.
fn strip_method(raw: &str) -> &str {
    let mut rest = raw;
    for keyword in ["FIRST", "ANY"] {
        let prefixed = rest
            .get(..keyword.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(keyword));
        if prefixed && rest[keyword.len()..].starts_with(char::is_whitespace) {
            rest = rest[keyword.len()..].trim_start();
            break;
        }
    }

    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return raw;
    }
    let after = rest[digits..].trim_start();
    match (after.strip_prefix('('), after.rfind(')')) {
        (Some(_), Some(close)) => &after[1..close],
        _ => raw,
    }
}

fn split_names(list: &str) -> Vec<StandbyName> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = list.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            ',' if !in_quotes => {
                push_name(&mut names, &mut current, quoted);
                quoted = false;
            }
            c if !in_quotes && c.is_whitespace() && (quoted || current.is_empty()) => {}
            c => current.push(c),
        }
    }
    push_name(&mut names, &mut current, quoted);
    names
}

fn push_name(names: &mut Vec<StandbyName>, current: &mut String, quoted: bool) {
    let name = if quoted {
        current.clone()
    } else {
        current.trim().to_string()
    };
    current.clear();
    if !name.trim().is_empty() {
        names.push(StandbyName { name, quoted });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &str) -> Vec<String> {
        ReplicationConfig::parse(raw).members.into_iter().map(|m| m.name).collect()
    }

    #[test]
    fn plain_list() {
        assert_eq!(names("s1, s2 ,s3"), vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn priority_and_quorum_forms() {
        assert_eq!(names("2 (s1, s2, s3)"), vec!["s1", "s2", "s3"]);
        assert_eq!(names("FIRST 1 (nodeB, nodeC)"), vec!["nodeB", "nodeC"]);
        assert_eq!(names("any 2(a,b)"), vec!["a", "b"]);
    }

    #[test]
    fn empty_setting_has_no_members() {
        assert!(ReplicationConfig::parse("").members.is_empty());
        assert!(ReplicationConfig::parse("   ").members.is_empty());
    }

    #[test]
    fn unquoted_names_ignore_case() {
        let config = ReplicationConfig::parse("FIRST 1 (NodeB)");
        assert!(config.is_synchronous("nodeb"));
        assert!(!config.is_synchronous("nodeC"));
    }

    #[test]
    fn quoted_names_are_exact() {
        let config = ReplicationConfig::parse(r#"1 ("Node, B", "x""y")"#);
        assert_eq!(names(r#"1 ("Node, B", "x""y")"#), vec!["Node, B", "x\"y"]);
        assert!(config.is_synchronous("Node, B"));
        assert!(!config.is_synchronous("node, b"));
    }

    #[test]
    fn wildcard_matches_everyone() {
        let config = ReplicationConfig::parse("*");
        assert!(config.is_synchronous("anything"));
    }

    #[test]
    fn name_starting_with_keyword_is_not_a_method() {
        assert_eq!(names("anyhost, firstnode"), vec!["anyhost", "firstnode"]);
    }
}
