use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use crate::store::Lesson;

/// Grade tokens outside K..6 sort after every recognized one.
const GRADE_UNMAPPED: u16 = 999;

/// The three filterable dimensions of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Grade,
    Subject,
    CtConcept,
}

impl Facet {
    pub const ALL: [Facet; 3] = [Facet::Grade, Facet::Subject, Facet::CtConcept];

    /// Key used for this facet in payloads and in the wire query state.
    pub fn key(self) -> &'static str {
        match self {
            Facet::Grade => "grade",
            Facet::Subject => "subject",
            Facet::CtConcept => "ctConcept",
        }
    }

    fn tokens(self, lesson: &Lesson) -> &[String] {
        match self {
            Facet::Grade => &lesson.grades,
            Facet::Subject => &lesson.subjects,
            Facet::CtConcept => &lesson.concepts,
        }
    }

    fn selected(self, facets: &FacetSelections) -> &[String] {
        match self {
            Facet::Grade => &facets.grade,
            Facet::Subject => &facets.subject,
            Facet::CtConcept => &facets.ct_concept,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacetSelections {
    pub grade: Vec<String>,
    pub subject: Vec<String>,
    pub ct_concept: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    LessonTitle,
    Grade,
    Subject,
    CtConcept,
    OriginalAuthor,
    DateFinalized,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// The single shared query state. The UI sends a whole snapshot with every
/// interaction; handlers replace the state in one assignment, never field by
/// field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryState {
    pub query: String,
    pub facets: FacetSelections,
    pub sort_by: SortKey,
    pub sort_dir: SortDir,
}

impl QueryState {
    /// The clear-filters action: query and selections reset, sort untouched.
    pub fn clear_filters(&mut self) {
        self.query.clear();
        self.facets = FacetSelections::default();
    }
}

/// Full filter predicate: text query plus every facet selection.
pub fn matches(lesson: &Lesson, state: &QueryState) -> bool {
    matches_query(lesson, &state.query)
        && Facet::ALL
            .iter()
            .all(|f| matches_facet(lesson, state, *f))
}

/// Case-insensitive substring match against title, author, and the display
/// joins of the three token fields. An empty query matches everything.
fn matches_query(lesson: &Lesson, query: &str) -> bool {
    let q = query.to_lowercase();
    if q.is_empty() {
        return true;
    }
    lesson.title.to_lowercase().contains(&q)
        || lesson.original_author.to_lowercase().contains(&q)
        || lesson.subject_display().to_lowercase().contains(&q)
        || lesson.concept_display().to_lowercase().contains(&q)
        || lesson.grade_display().to_lowercase().contains(&q)
}

/// A facet with no selection passes every lesson; otherwise at least one
/// selected value must equal one of the lesson's tokens for that facet.
fn matches_facet(lesson: &Lesson, state: &QueryState, facet: Facet) -> bool {
    let selected = facet.selected(&state.facets);
    selected.is_empty()
        || selected
            .iter()
            .any(|sel| facet.tokens(lesson).iter().any(|t| t.eq_ignore_ascii_case(sel)))
}

/// Derive the filtered, sorted view. Always rebuilt from the full store;
/// nothing is cached between recomputations.
pub fn derive_view<'a>(lessons: &'a [Lesson], state: &QueryState) -> Vec<&'a Lesson> {
    let mut view: Vec<&Lesson> = lessons.iter().filter(|l| matches(l, state)).collect();
    view.sort_by(|a, b| {
        let ord = compare(a, b, state.sort_by);
        match state.sort_dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
    view
}

fn compare(a: &Lesson, b: &Lesson, key: SortKey) -> Ordering {
    match key {
        SortKey::Grade => grade_ordinal(a).cmp(&grade_ordinal(b)),
        _ => natural_cmp(&sort_field(a, key), &sort_field(b, key)),
    }
}

fn sort_field(lesson: &Lesson, key: SortKey) -> String {
    match key {
        SortKey::LessonTitle => lesson.title.clone(),
        SortKey::Grade => lesson.grade_display(),
        SortKey::Subject => lesson.subject_display(),
        SortKey::CtConcept => lesson.concept_display(),
        SortKey::OriginalAuthor => lesson.original_author.clone(),
        SortKey::DateFinalized => lesson.date_finalized.clone().unwrap_or_default(),
    }
}

/// Grade sorting looks at the first grade token only: K sorts before 1..6,
/// anything unrecognized sorts last. Ties get no secondary key.
fn grade_ordinal(lesson: &Lesson) -> u16 {
    let Some(first) = lesson.grades.first() else {
        return GRADE_UNMAPPED;
    };
    if first.eq_ignore_ascii_case("K") {
        return 0;
    }
    match first.as_str() {
        "1" => 1,
        "2" => 2,
        "3" => 3,
        "4" => 4,
        "5" => 5,
        "6" => 6,
        _ => GRADE_UNMAPPED,
    }
}

/// Case-insensitive, numeric-aware lexicographic comparison: digit runs
/// compare by value, so "Lesson 2" sorts before "Lesson 10".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();
    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_digits(&mut ca);
                let nb = take_digits(&mut cb);
                match na.cmp(&nb) {
                    Ordering::Equal => {}
                    ord => return ord,
                }
            }
            (Some(x), Some(y)) => {
                let xl = x.to_ascii_lowercase();
                let yl = y.to_ascii_lowercase();
                if xl != yl {
                    return xl.cmp(&yl);
                }
                ca.next();
                cb.next();
            }
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars>) -> u64 {
    let mut n: u64 = 0;
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        n = n.saturating_mul(10).saturating_add(u64::from(c as u8 - b'0'));
        chars.next();
    }
    n
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
    pub selected: bool,
}

/// Count facet values over the store restricted by the text query and by the
/// *other* facets' selections, never this facet's own. The result answers
/// "how many hits would each option add if selected". Sorted alphabetically
/// (numeric-aware) by token, not by count.
pub fn facet_counts(lessons: &[Lesson], state: &QueryState, facet: Facet) -> Vec<FacetCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for lesson in lessons {
        if !matches_query(lesson, &state.query) {
            continue;
        }
        let others_pass = Facet::ALL
            .iter()
            .filter(|f| **f != facet)
            .all(|f| matches_facet(lesson, state, *f));
        if !others_pass {
            continue;
        }
        for token in facet.tokens(lesson) {
            *counts.entry(token.clone()).or_insert(0) += 1;
        }
    }

    let selected = facet.selected(&state.facets);
    let mut out: Vec<FacetCount> = counts
        .into_iter()
        .map(|(value, count)| FacetCount {
            selected: selected.iter().any(|s| s.eq_ignore_ascii_case(&value)),
            value,
            count,
        })
        .collect();
    out.sort_by(|a, b| natural_cmp(&a.value, &b.value));
    out
}
