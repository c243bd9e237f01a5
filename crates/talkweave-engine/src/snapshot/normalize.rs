use serde::Serialize;

use crate::discussion::Discussion;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snap {
    pub comments: Vec<CommentSnap>,
    pub sections: Vec<SectionSnap>,
    pub failures: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentSnap {
    pub id: usize,
    pub author: String,
    pub date: String,
    pub level: usize,
    pub parent: Option<usize>,
    pub section: Option<String>,
    pub elements: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSnap {
    pub headline: String,
    pub level: u8,
    pub parent: Option<String>,
    pub comments: Vec<usize>,
}

/// Node handles never appear in a `Snap`, so snaps of separate passes compare equal.
pub fn normalize<N>(discussion: &Discussion<N>) -> Snap {
    let headline = |id| discussion.section(id).map(|s| s.headline.clone());

    let comments = discussion
        .comments()
        .iter()
        .map(|c| CommentSnap {
            id: c.id.0,
            author: c.author.clone(),
            date: c.date_text.clone(),
            level: c.level,
            parent: discussion.parent(c.id).map(|p| p.0),
            section: discussion.section_of(c.id).and_then(headline),
            elements: c.elements.len(),
            text: c.text.clone(),
        })
        .collect();

    let sections = discussion
        .sections()
        .iter()
        .map(|s| SectionSnap {
            headline: s.headline.clone(),
            level: s.level,
            parent: s.parent.and_then(headline),
            comments: s.comments.iter().map(|c| c.0).collect(),
        })
        .collect();

    Snap {
        comments,
        sections,
        failures: discussion.failures().len(),
    }
}
