use serde::{Deserialize, Serialize};

use crate::domain::entity::course::Course;
use crate::domain::entity::revert_log::RevertEntry;
use crate::domain::entity::user::User;

/// OutcomeKind は1行の適用結果の種別を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Modified,
    Skipped,
    ErrorLookup,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Modified => write!(f, "MODIFIED"),
            Self::Skipped => write!(f, "SKIPPED"),
            Self::ErrorLookup => write!(f, "ERROR_LOOKUP"),
        }
    }
}

/// RowOutcome は検証済みの1行を適用した結果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub kind: OutcomeKind,
    pub course: Option<Course>,
    pub user: Option<User>,
    pub message: String,
    pub revert: Option<RevertEntry>,
}

impl RowOutcome {
    pub fn course_not_found(course_id: &str) -> Self {
        Self {
            kind: OutcomeKind::ErrorLookup,
            course: None,
            user: None,
            message: format!("Unable to find course matching CourseID: \"{course_id}\""),
            revert: None,
        }
    }

    pub fn user_not_found(course: Course, user_id: &str) -> Self {
        Self {
            kind: OutcomeKind::ErrorLookup,
            course: Some(course),
            user: None,
            message: format!("Unable to find user matching UserID: \"{user_id}\""),
            revert: None,
        }
    }

    pub fn no_completion(course: Course, user: User, user_id: &str, course_id: &str) -> Self {
        Self {
            kind: OutcomeKind::Skipped,
            course: Some(course),
            user: Some(user),
            message: format!(
                "The user matching {user_id} does not have a completion in course matching {course_id}"
            ),
            revert: None,
        }
    }

    pub fn modified(
        course: Course,
        user: User,
        revert: RevertEntry,
        new_timestamp: &str,
    ) -> Self {
        let message = format!(
            "[User: {}| Course: {}] - updated completion timestamp from: {} to: {}",
            revert.user_id, revert.course_id, revert.prior_timestamp, new_timestamp
        );
        Self {
            kind: OutcomeKind::Modified,
            course: Some(course),
            user: Some(user),
            message,
            revert: Some(revert),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.kind == OutcomeKind::Modified
    }

    /// トラッカーに渡すステータス行を返す。
    pub fn status_messages(&self) -> Vec<String> {
        let headline = if self.is_modified() {
            "Course completion updated"
        } else {
            "Course completion skipped"
        };
        vec![headline.to_string(), self.message.clone()]
    }
}
