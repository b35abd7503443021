//! Placeholder records shown before anything has been saved.
//!
//! Sample children are recognised by id. Their `isSample` flag is derived
//! from it on every write, and the tracker refuses to delete them.

use chrono::NaiveDate;

use crate::dates::StoredDate;
use crate::model::{Child, Gender, Measurement, TimelineEvent, TimelineEventKind};

pub const SAMPLE_CHILD_IDS: [&str; 2] = ["sample-emma", "sample-liam"];

fn date(year: i32, month: u32, day: u32) -> StoredDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(StoredDate::from)
        .unwrap_or_else(|| StoredDate::Unparsed(format!("{:04}-{:02}-{:02}", year, month, day)))
}

pub fn sample_children() -> Vec<Child> {
    vec![
        Child {
            id: SAMPLE_CHILD_IDS[0].to_string(),
            name: "Emma".to_string(),
            date_of_birth: Some(date(2023, 9, 12)),
            age_text: None,
            gender: Gender::Female,
            profile_image_url: None,
            birth_weight: Some(Measurement::new(3.2, "kg")),
            birth_height: Some(Measurement::new(49.5, "cm")),
            is_sample: true,
        },
        Child {
            id: SAMPLE_CHILD_IDS[1].to_string(),
            name: "Liam".to_string(),
            date_of_birth: Some(date(2021, 4, 3)),
            age_text: None,
            gender: Gender::Male,
            profile_image_url: None,
            birth_weight: Some(Measurement::new(3.6, "kg")),
            birth_height: None,
            is_sample: true,
        },
    ]
}

pub fn sample_timeline() -> Vec<TimelineEvent> {
    let event = |id: &str, kind, title: &str, description: &str, on| TimelineEvent {
        id: id.to_string(),
        child_id: Some(SAMPLE_CHILD_IDS[0].to_string()),
        kind,
        title: title.to_string(),
        description: description.to_string(),
        date: on,
        media_url: None,
    };
    vec![
        event(
            "sample-timeline-1",
            TimelineEventKind::Milestone,
            "First smile",
            "Smiled at grandma during breakfast.",
            date(2023, 10, 30),
        ),
        event(
            "sample-timeline-2",
            TimelineEventKind::Vaccine,
            "Two month vaccines",
            "Routine immunisations at the clinic.",
            date(2023, 11, 14),
        ),
        event(
            "sample-timeline-3",
            TimelineEventKind::Milestone,
            "Rolled over",
            "",
            date(2024, 1, 20),
        ),
    ]
}

pub fn is_sample_child_id(id: &str) -> bool {
    SAMPLE_CHILD_IDS.contains(&id)
}
