use serde::{Deserialize, Serialize};

/// Anything that can be compared with RBO.
///
/// Members are read in rank order. They are treated as a set: an identifier that
/// appears twice only counts once toward the overlap.
pub trait RankedList {
    fn label(&self) -> &str;

    fn members(&self) -> &[String];

    fn len(&self) -> usize {
        self.members().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Named list of identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleList {
    pub label: String,
    pub members: Vec<String>,
}

impl SimpleList {
    pub fn new<L, I, M>(label: L, members: I) -> Self
    where
        L: Into<String>,
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        Self {
            label: label.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

impl RankedList for SimpleList {
    fn label(&self) -> &str {
        &self.label
    }

    fn members(&self) -> &[String] {
        &self.members
    }
}

/// Members in rank order, truncated to the advertised length
pub(crate) fn ranked<L: RankedList + ?Sized>(list: &L) -> &[String] {
    let members = list.members();
    &members[..list.len().min(members.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Truncated(SimpleList);

    impl RankedList for Truncated {
        fn label(&self) -> &str {
            self.0.label()
        }

        fn members(&self) -> &[String] {
            self.0.members()
        }

        fn len(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_simple_list_from_str_slices() {
        let list = SimpleList::new("serp", ["a", "b", "c"]);
        assert_eq!(list.label(), "serp");
        assert_eq!(list.len(), 3);
        assert!(!list.is_empty());
    }

    #[test]
    fn test_ranked_honours_len() {
        let list = Truncated(SimpleList::new("t", ["a", "b", "c"]));
        assert_eq!(ranked(&list), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_simple_list_deserialize() {
        let list: SimpleList =
            serde_json::from_str(r#"{"label": "q1", "members": ["x", "y"]}"#).unwrap();
        assert_eq!(list, SimpleList::new("q1", ["x", "y"]));
    }
}
