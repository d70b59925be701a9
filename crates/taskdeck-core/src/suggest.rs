//! Goal-to-task suggestions backed by a fixed keyword lookup.
//!
//! Nothing here is inferred: a goal is lower-cased and checked against each
//! keyword in declaration order, and the first hit returns that keyword's
//! canned template list. Goals that hit nothing get a generic plan built from
//! the goal text itself.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on the entries returned for a keyword match.
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedTask {
    pub title: String,
    pub notes: String,
}

impl SuggestedTask {
    fn new(title: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            notes: notes.into(),
        }
    }
}

struct Template {
    keyword: &'static str,
    tasks: &'static [(&'static str, &'static str)],
}

// Order matters: the first contained keyword wins.
const TEMPLATES: &[Template] = &[
    Template {
        keyword: "fit",
        tasks: &[
            (
                "Create a workout schedule",
                "Plan out 3-4 days of exercise per week with specific activities",
            ),
            (
                "Set up meal prep routine",
                "Prepare healthy meals in advance for the week",
            ),
            ("Track daily water intake", "Aim for 8 glasses of water per day"),
            (
                "Find a workout buddy",
                "Partner with someone for accountability and motivation",
            ),
        ],
    },
    Template {
        keyword: "wedding",
        tasks: &[
            (
                "Set wedding budget",
                "Determine overall budget and allocate to different categories",
            ),
            ("Create guest list", "Draft initial list of guests to invite"),
            (
                "Book wedding venue",
                "Research and visit potential venues, make reservation",
            ),
            (
                "Hire wedding photographer",
                "Review portfolios and book a professional photographer",
            ),
            (
                "Choose wedding theme",
                "Decide on color scheme and overall aesthetic",
            ),
        ],
    },
    Template {
        keyword: "study",
        tasks: &[
            ("Create study schedule", "Block out dedicated study time each day"),
            (
                "Organize study materials",
                "Gather and organize all textbooks, notes, and resources",
            ),
            (
                "Join study group",
                "Find or create a group for collaborative learning",
            ),
            (
                "Set up distraction-free zone",
                "Create a dedicated study space with minimal interruptions",
            ),
        ],
    },
    Template {
        keyword: "travel",
        tasks: &[
            (
                "Research destinations",
                "Compare potential travel locations and activities",
            ),
            (
                "Set travel budget",
                "Calculate costs for flights, accommodation, and activities",
            ),
            (
                "Book flights and hotels",
                "Reserve transportation and accommodation",
            ),
            (
                "Create packing list",
                "List all essential items to bring on the trip",
            ),
            (
                "Plan daily itinerary",
                "Outline activities and sights for each day",
            ),
        ],
    },
];

/// Keywords recognised by [`generate`], in match order.
pub fn keywords() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|template| template.keyword)
}

/// Suggested tasks for `goal`. Never empty, never fails; blank goals are the
/// caller's concern and simply fall through to the generic plan.
#[tracing::instrument]
pub fn generate(goal: &str) -> Vec<SuggestedTask> {
    let goal_lower = goal.to_lowercase();

    if let Some(template) = TEMPLATES
        .iter()
        .find(|template| goal_lower.contains(template.keyword))
    {
        debug!(keyword = template.keyword, "goal matched template");
        return template
            .tasks
            .iter()
            .take(MAX_SUGGESTIONS)
            .map(|(title, notes)| SuggestedTask::new(*title, *notes))
            .collect();
    }

    debug!("no template matched; using generic plan");
    generic_plan(goal)
}

fn generic_plan(goal: &str) -> Vec<SuggestedTask> {
    vec![
        SuggestedTask::new(
            format!("Research about {goal}"),
            "Gather information and resources to get started",
        ),
        SuggestedTask::new(
            format!("Create action plan for {goal}"),
            "Break down the goal into smaller, manageable steps",
        ),
        SuggestedTask::new(
            format!("Set milestones for {goal}"),
            "Define key checkpoints to track progress",
        ),
        SuggestedTask::new(
            "Identify resources needed",
            "List tools, materials, or help required",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn titles(tasks: &[SuggestedTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn wedding_goal_returns_wedding_plan_in_order() {
        for goal in ["Plan my WEDDING", "wedding", "our Wedding in june"] {
            let tasks = generate(goal);
            assert_eq!(
                titles(&tasks),
                vec![
                    "Set wedding budget",
                    "Create guest list",
                    "Book wedding venue",
                    "Hire wedding photographer",
                    "Choose wedding theme",
                ]
            );
        }
    }

    #[test]
    fn earlier_keyword_wins() {
        // "fit" is declared before "wedding".
        let tasks = generate("get fit before the wedding");
        assert_eq!(tasks[0].title, "Create a workout schedule");
        assert_eq!(tasks.len(), 4);
    }

    #[test]
    fn keyword_matches_inside_words() {
        let tasks = generate("Improve fitness");
        assert_eq!(tasks[0].title, "Create a workout schedule");

        let tasks = generate("Students' guide");
        assert_eq!(tasks[0].title, "Research about Students' guide");
    }

    #[test]
    fn unmatched_goal_interpolates_verbatim_text() {
        let goal = "Learn Rust (Fast!) [.*]";
        let tasks = generate(goal);
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks[0].title, format!("Research about {goal}"));
        assert_eq!(tasks[1].title, format!("Create action plan for {goal}"));
        assert_eq!(tasks[2].title, format!("Set milestones for {goal}"));
        assert_eq!(tasks[3].title, "Identify resources needed");
        assert_eq!(tasks[3].notes, "List tools, materials, or help required");
    }

    #[test]
    fn empty_goal_falls_back_to_generic_plan() {
        let tasks = generate("");
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks[0].title, "Research about ");
        assert_eq!(tasks[2].title, "Set milestones for ");
    }

    #[test]
    fn templates_stay_within_limit_and_keywords_are_ordered() {
        assert!(TEMPLATES.iter().all(|t| !t.tasks.is_empty()));
        assert!(TEMPLATES.iter().all(|t| t.tasks.len() <= MAX_SUGGESTIONS));
        assert_eq!(
            keywords().collect::<Vec<_>>(),
            vec!["fit", "wedding", "study", "travel"]
        );
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate("travel to Peru"), generate("travel to Peru"));
    }
}
