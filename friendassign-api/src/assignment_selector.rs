use crate::assignment::Assignment;

/// Picks an assignment out of a fetched list by id, falling back to an exact title match.
#[derive(Debug, Clone)]
pub struct AssignmentSelector {
    selector: String,
}

impl AssignmentSelector {
    pub fn new(selector: String) -> Self {
        Self { selector }
    }

    pub fn select_from<'a>(&self, assignments: &'a [Assignment]) -> Option<&'a Assignment> {
        self.select_as_id(assignments)
            .or_else(|| self.select_as_title(assignments))
    }

    fn select_as_id<'a>(&self, assignments: &'a [Assignment]) -> Option<&'a Assignment> {
        assignments
            .iter()
            .find(|assignment| assignment.id().as_str() == self.selector)
    }

    fn select_as_title<'a>(&self, assignments: &'a [Assignment]) -> Option<&'a Assignment> {
        assignments.iter().find(|assignment| {
            assignment
                .title()
                .as_str()
                .eq_ignore_ascii_case(self.selector.trim())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::{AssignmentTitle, Difficulty, DueDate};
    use crate::types::{DisplayName, Email, Identity, Marks};

    fn assignment(id: &str, title: &str) -> Assignment {
        Assignment::new(
            id.into(),
            AssignmentTitle::new(title.to_owned()),
            String::new(),
            Marks::ZERO,
            String::new(),
            Difficulty::Easy,
            "2030-01-01".parse::<DueDate>().unwrap(),
            Identity::new(Email::from("a@x.com"), DisplayName::anonymous()),
        )
    }

    #[test]
    fn ids_win_over_titles() {
        let assignments = [assignment("essay", "Other"), assignment("2", "essay")];

        let by_id = AssignmentSelector::new("essay".to_owned()).select_from(&assignments);
        assert_eq!(by_id.unwrap().id().as_str(), "essay");

        let by_title = AssignmentSelector::new("OTHER".to_owned()).select_from(&assignments);
        assert_eq!(by_title.unwrap().id().as_str(), "essay");

        assert!(AssignmentSelector::new("none".to_owned()).select_from(&assignments).is_none());
    }
}
