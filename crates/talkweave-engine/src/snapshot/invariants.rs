use crate::discussion::{CommentId, Discussion};

pub fn check<N>(discussion: &Discussion<N>) {
    let comments = discussion.comments();
    for (index, c) in comments.iter().enumerate() {
        assert_eq!(c.id, CommentId(index), "comment ids must be sequential");
        assert!(!c.elements.is_empty(), "comment {} has no elements", c.id);
        if index > 0 {
            assert!(
                comments[index - 1].position < c.position,
                "comment {} out of document order",
                c.id
            );
        }

        if let Some(section) = discussion.section_of(c.id) {
            let position = discussion.section(section).map(|s| s.position);
            assert!(
                position.is_some_and(|p| p < c.position),
                "comment {} precedes its section {section}",
                c.id
            );
        }

        let Some(parent) = discussion.parent(c.id) else {
            continue;
        };
        assert!(parent < c.id, "comment {} replies to a later comment", c.id);
        if c.is_outdented {
            assert_eq!(parent.0 + 1, c.id.0, "outdented comment {} skips back", c.id);
            continue;
        }
        let parent_level = comments[parent.0].level;
        assert!(
            parent_level < c.level,
            "comment {} (level {}) has parent {parent} at level {parent_level}",
            c.id,
            c.level
        );
        assert_eq!(
            discussion.section_of(parent),
            discussion.section_of(c.id),
            "comment {} and parent {parent} are in different sections",
            c.id
        );
    }

    for pair in discussion.sections().windows(2) {
        assert!(pair[0].position < pair[1].position, "sections out of document order");
    }
}
