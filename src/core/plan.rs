//! Act / chapter / scene outline of a story.
//!
//! Generated outlines arrive as loosely formatted text. Parsing is layered:
//! boundaries are found with patterns, short fragments are filtered out as
//! noise, and act splitting has a plain-substring fallback. Rendering back to
//! text renumbers chapters globally; repeated render/parse rounds reach a
//! fixed point.

use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Number of acts a well-formed plan has.
pub const ACT_COUNT: usize = 3;

/// Fragments with fewer words than this are treated as noise.
const MIN_CONTENT_WORDS: usize = 4;

/// How many leading lines of a generated scene are checked for echoed headers.
const HEADER_ECHO_WINDOW: usize = 5;

static ACT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\n\s*Act\s*(?:\d+|[IVXLCDM]+)?[:.\s]*").unwrap());

static ACT_NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+\s*[:.]?|[IVXLCDM]+\s*[:.])\s*").unwrap());

static ACT_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Act \d").unwrap());

static CHAPTER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n.{0,20}?Chapter .+:").unwrap());

static CHAPTER_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Chapter (\d+)").unwrap());

static SCENE_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Scene \d+.{0,10}?:").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub acts: Vec<Act>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Act {
    #[serde(rename = "act_descr")]
    pub description: String,
    pub chapters: Vec<String>,
    /// Raw scene breakdown returned by the generator for this act.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_scenes: Option<String>,
    /// Scene descriptions keyed by global chapter number.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub chapter_scenes: BTreeMap<usize, Vec<String>>,
}

/// Position of a chapter inside a plan. All numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterRef {
    pub number: usize,
    pub act: usize,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneRef<'a> {
    pub act: usize,
    pub chapter: usize,
    pub scene: usize,
    pub description: &'a str,
}

impl Act {
    pub fn new(description: impl Into<String>, chapters: Vec<String>) -> Self {
        Self {
            description: description.into(),
            chapters,
            ..Default::default()
        }
    }
}

impl Plan {
    pub fn new(acts: Vec<Act>) -> Self {
        Self { acts }
    }

    pub fn is_empty(&self) -> bool {
        self.acts.is_empty()
    }

    /// A plan is complete when it has exactly three acts.
    pub fn is_complete(&self) -> bool {
        self.acts.len() == ACT_COUNT
    }

    /// Global chapter numbering, built from the act sequence.
    pub fn chapter_index(&self) -> Vec<ChapterRef> {
        let mut index = Vec::new();
        let mut number = 1;
        for (a, act) in self.acts.iter().enumerate() {
            for position in 1..=act.chapters.len() {
                index.push(ChapterRef {
                    number,
                    act: a + 1,
                    position,
                });
                number += 1;
            }
        }
        index
    }

    /// Global chapter numbers belonging to act `act_num` (1-based).
    pub fn act_chapter_numbers(&self, act_num: usize) -> Vec<usize> {
        self.chapter_index()
            .into_iter()
            .filter(|c| c.act == act_num)
            .map(|c| c.number)
            .collect()
    }

    pub fn chapter(&self, number: usize) -> Option<&str> {
        let found = self.chapter_index().into_iter().find(|c| c.number == number)?;
        self.acts[found.act - 1]
            .chapters
            .get(found.position - 1)
            .map(String::as_str)
    }

    /// Replaces act `act_num` (1-based). Returns false when no such act exists.
    pub fn set_act(&mut self, act_num: usize, act: Act) -> bool {
        match act_num.checked_sub(1).and_then(|i| self.acts.get_mut(i)) {
            Some(slot) => {
                *slot = act;
                true
            }
            None => false,
        }
    }

    /// Every broken-down scene in reading order.
    pub fn scene_refs(&self) -> Vec<SceneRef<'_>> {
        let mut refs = Vec::new();
        for (a, act) in self.acts.iter().enumerate() {
            for (&chapter, scenes) in &act.chapter_scenes {
                for (s, description) in scenes.iter().enumerate() {
                    refs.push(SceneRef {
                        act: a + 1,
                        chapter,
                        scene: s + 1,
                        description: description.as_str(),
                    });
                }
            }
        }
        refs
    }

    /// Canonical text form used when the plan is fed back into prompts.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let mut ch_num = 1;
        for (i, act) in self.acts.iter().enumerate() {
            let mut block = act_block(&act.description, i + 1);
            for chapter in &act.chapters {
                block.push_str(&format!("- Chapter {}: {}\n", ch_num, chapter));
                ch_num += 1;
            }
            text.push_str(&block);
            text.push('\n');
        }
        text.trim().to_string()
    }

    /// Renders the plan up to and including act `act_num`.
    ///
    /// Returns the text together with the global chapter numbers of that act,
    /// which the scene breakdown has to line up with.
    pub fn act_to_text(&self, act_num: usize) -> (String, Vec<usize>) {
        let mut text = String::new();
        let mut chapters = Vec::new();
        let mut ch_num = 1;
        for (i, act) in self.acts.iter().enumerate() {
            if i + 1 > act_num {
                break;
            }
            let mut block = act_block(&act.description, i + 1);
            for chapter in &act.chapters {
                block.push_str(&format!("- Chapter {}: {}\n", ch_num, chapter));
                if i + 1 == act_num {
                    chapters.push(ch_num);
                }
                ch_num += 1;
            }
            text.push_str(&block);
            text.push('\n');
        }
        (text.trim().to_string(), chapters)
    }

    /// Human-readable scene breakdown, one block per act.
    pub fn scenes_to_text(&self) -> String {
        let mut lines = Vec::new();
        for (i, act) in self.acts.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            lines.push(format!("--- ACT {} ---", i + 1));
            lines.push(act.description.trim().to_string());
            if act.chapter_scenes.is_empty() {
                lines.push("  (no scenes)".to_string());
            }
            for (&number, scenes) in &act.chapter_scenes {
                lines.push(String::new());
                match self.chapter(number) {
                    Some(outline) => lines.push(format!("  Chapter {}: {}", number, outline)),
                    None => lines.push(format!("  Chapter {}:", number)),
                }
                for (s, description) in scenes.iter().enumerate() {
                    lines.push(format!("    Scene {}: {}", s + 1, description));
                }
            }
        }
        lines.join("\n")
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Act description followed by a newline, with a synthesized `Act N:` header
/// unless the description already names its act near the start.
fn act_block(description: &str, act_num: usize) -> String {
    let block = format!("{}\n", description);
    let head: String = block.chars().take(50).collect();
    if ACT_LABEL.is_match(&head) {
        block
    } else {
        format!("Act {}:\n{}", act_num, block)
    }
}

fn has_content(text: &str) -> bool {
    text.split_whitespace().count() >= MIN_CONTENT_WORDS
}

fn preview(text: &str) -> String {
    text.chars().take(500).collect()
}

/// Splits an outline into the bodies of its three acts.
///
/// Returns an empty vector when three acts cannot be found; the caller is
/// expected to ask the generator again.
pub fn split_by_act(text: &str) -> Vec<String> {
    let acts: Vec<String> = ACT_MARKER
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if acts.len() == ACT_COUNT {
        return acts;
    }
    warn!(
        "split_by_act: found {} acts with marker split, trying fallback. Plan: {}...",
        acts.len(),
        preview(text)
    );

    let acts: Vec<String> = text
        .split("Act ")
        .map(|s| ACT_NUMBER_PREFIX.replace(s.trim(), "").trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if acts.len() == ACT_COUNT {
        return acts;
    }
    warn!(
        "split_by_act: found {} acts after fallback. Plan: {}...",
        acts.len(),
        preview(text)
    );
    Vec::new()
}

/// Splits one act body into its description and chapter descriptions.
pub fn parse_act(text: &str) -> Act {
    let mut segments = CHAPTER_HEADER.split(text.trim());
    let description = segments.next().unwrap_or_default().trim().to_string();
    let chapters = segments
        .map(str::trim)
        .filter(|s| has_content(s))
        .map(String::from)
        .collect();
    Act::new(description, chapters)
}

/// Parses a generated outline. Acts without chapters are dropped, so the
/// result may hold fewer than three acts.
pub fn parse_text_plan(text: &str) -> Plan {
    let acts = split_by_act(text)
        .iter()
        .map(|body| parse_act(body))
        .filter(|act| !act.chapters.is_empty())
        .collect();
    Plan::new(acts)
}

pub fn normalize_text_plan(text: &str) -> String {
    parse_text_plan(text).to_text()
}

/// Parses the raw scene breakdown of one act.
///
/// Text is grouped under `Chapter N` markers. When the breakdown mentions
/// more chapters than the act owns, only the act's own chapter numbers are
/// kept; otherwise the numbers are taken as written. Scenes with fewer than
/// four words are dropped and chapters left without scenes are omitted.
pub fn parse_act_scenes(raw: &str, expected_chapters: &[usize]) -> BTreeMap<usize, Vec<String>> {
    let raw = raw.trim();

    let mut markers = Vec::new();
    for caps in CHAPTER_MARKER.captures_iter(raw) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if let Ok(number) = digits.as_str().parse::<usize>() {
            markers.push((number, whole.start(), whole.end()));
        }
    }

    // chapter number -> text, in order of first appearance
    let mut merged: Vec<(usize, String)> = Vec::new();
    for (i, &(number, _, end)) in markers.iter().enumerate() {
        let next_start = markers.get(i + 1).map_or(raw.len(), |m| m.1);
        let snippet = raw[end..next_start].trim();
        match merged.iter_mut().find(|(n, _)| *n == number) {
            Some((_, text)) => {
                if !snippet.is_empty() {
                    text.push('\n');
                    text.push_str(snippet);
                }
            }
            None => merged.push((number, snippet.to_string())),
        }
    }

    if merged.len() > expected_chapters.len() {
        merged.retain(|(n, _)| expected_chapters.contains(n));
    }

    let mut chapter_scenes = BTreeMap::new();
    for (number, text) in merged {
        let scenes: Vec<String> = SCENE_MARKER
            .split(&text)
            .skip(1)
            .map(str::trim)
            .filter(|s| has_content(s))
            .map(String::from)
            .collect();
        if !scenes.is_empty() {
            chapter_scenes.insert(number, scenes);
        }
    }
    chapter_scenes
}

fn is_header_echo(line: &str) -> bool {
    line.contains("Chapter ") || line.contains("Scene ")
}

fn starts_new_section(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("Chapter ") || line.starts_with("Scene ")
}

/// Cleans generated scene prose.
///
/// Everything up to the last header line within the first few lines is
/// treated as an echo and removed. The rest is cut at the first line that
/// opens another chapter or scene.
pub fn prepare_scene_text(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();

    let start = lines
        .iter()
        .take(HEADER_ECHO_WINDOW)
        .rposition(|line| is_header_echo(line))
        .map_or(0, |i| i + 1);

    let body = &lines[start..];
    let end = body
        .iter()
        .position(|line| starts_new_section(line))
        .unwrap_or(body.len());
    body[..end].join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_PLAN: &str = "Act 1: Setup\n\
        The hero lives a quiet life.\n\
        - Chapter 1: The hero wakes up in a small village.\n\
        - Chapter 2: A stranger arrives with urgent news.\n\
        \n\
        Act 2: Confrontation\n\
        The journey tests everyone.\n\
        - Chapter 1: The party crosses the burning desert.\n\
        - Chapter 2: A betrayal splits the group apart.\n\
        \n\
        Act 3: Resolution\n\
        Everything comes to a head.\n\
        - Chapter 1: The hero faces the tyrant alone.\n\
        - Chapter 2: Peace returns to the quiet village.";

    #[test]
    fn test_split_by_act_finds_three_acts() {
        let acts = split_by_act(RAW_PLAN);
        assert_eq!(acts.len(), 3);
        assert!(acts[0].starts_with("Act 1: Setup"));
        assert!(acts[1].starts_with("Confrontation"));
        assert!(acts[2].starts_with("Resolution"));
        assert!(acts.iter().all(|a| a == a.trim()));
    }

    #[test]
    fn test_split_by_act_roman_numerals_and_case() {
        let text = "ACT I. The calm before the storm arrives.\n\
            act ii: Things fall apart in the capital.\n\
            Act III The final reckoning comes at last.";
        let acts = split_by_act(text);
        assert_eq!(
            acts,
            vec![
                "ACT I. The calm before the storm arrives.".to_string(),
                "Things fall apart in the capital.".to_string(),
                "The final reckoning comes at last.".to_string(),
            ]
        );
    }

    #[test]
    fn test_split_by_act_preamble_fails() {
        let text = "Here is your outline:\nAct 1: The hero leaves home.\n\
            Act 2: The hero is tested.\nAct 3: The hero returns.";
        assert!(split_by_act(text).is_empty());
    }

    #[test]
    fn test_split_by_act_fallback_on_inline_markers() {
        let text = "Act 1: The hero leaves home. Act 2: The hero is tested. Act 3: The hero returns.";
        let acts = split_by_act(text);
        assert_eq!(
            acts,
            vec![
                "The hero leaves home.".to_string(),
                "The hero is tested.".to_string(),
                "The hero returns.".to_string(),
            ]
        );
    }

    #[test]
    fn test_split_by_act_fallback_strips_roman_prefixes() {
        let text = "Act I. Alpha beta gamma. Act II. Delta epsilon zeta. Act III: Eta theta iota.";
        let acts = split_by_act(text);
        assert_eq!(
            acts,
            vec![
                "Alpha beta gamma.".to_string(),
                "Delta epsilon zeta.".to_string(),
                "Eta theta iota.".to_string(),
            ]
        );
    }

    #[test]
    fn test_split_by_act_fallback_keeps_roman_looking_words() {
        let text = "Act 1: I went home early. Act 2: Mixed feelings grow. Act 3: Done at last.";
        let acts = split_by_act(text);
        assert_eq!(acts[0], "I went home early.");
        assert_eq!(acts[1], "Mixed feelings grow.");
    }

    #[test]
    fn test_split_by_act_fails_on_wrong_count() {
        assert!(split_by_act("Act 1: Only one act here.\nAct 2: And a second.").is_empty());
        assert!(split_by_act("").is_empty());
    }

    #[test]
    fn test_parse_act_filters_short_chapters() {
        let act = parse_act(
            "The act opens in winter.\n\
             - Chapter 1: Too short here\n\
             - Chapter 2: This one has enough words.\n\
             Chapter 3: Four words exactly here",
        );
        assert_eq!(act.description, "The act opens in winter.");
        assert_eq!(
            act.chapters,
            vec![
                "This one has enough words.".to_string(),
                "Four words exactly here".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_act_without_chapters() {
        let act = parse_act("Just a description with no chapter headers at all.");
        assert_eq!(act.description, "Just a description with no chapter headers at all.");
        assert!(act.chapters.is_empty());
    }

    #[test]
    fn test_parse_text_plan_drops_empty_acts() {
        let text = "Act 1: Opening\n- Chapter 1: Mara finds the hidden letter.\n\
            Act 2: Middle act without any chapters listed.\n\
            Act 3: End\n- Chapter 2: Mara burns the letter at dawn.";
        let plan = parse_text_plan(text);
        assert_eq!(plan.acts.len(), 2);
        assert!(!plan.is_complete());
    }

    #[test]
    fn test_end_to_end_three_acts_six_chapters() {
        let plan = parse_text_plan(RAW_PLAN);
        assert_eq!(plan.acts.len(), 3);
        assert!(plan.acts.iter().all(|a| a.chapters.len() == 2));

        let text = plan.to_text();
        for n in 1..=6 {
            assert!(text.contains(&format!("- Chapter {}: ", n)), "missing chapter {}", n);
        }
        assert!(!text.contains("- Chapter 7: "));
        assert!(text.starts_with("Act 1: Setup"));
        assert!(text.contains("Act 2:\nConfrontation"));
        assert!(text.contains("- Chapter 3: The party crosses the burning desert."));
        assert!(text.contains("- Chapter 6: Peace returns to the quiet village."));
        assert_eq!(text, text.trim_end());
    }

    #[test]
    fn test_chapter_numbering_is_contiguous() {
        let plan = parse_text_plan(RAW_PLAN);
        let text = plan.to_text();
        let numbers: Vec<usize> = CHAPTER_MARKER
            .captures_iter(&text)
            .map(|c| c[1].parse().unwrap())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);

        let index = plan.chapter_index();
        assert_eq!(
            index[2],
            ChapterRef {
                number: 3,
                act: 2,
                position: 1,
            }
        );
        assert_eq!(plan.chapter(5), Some("The hero faces the tyrant alone."));
        assert_eq!(plan.chapter(7), None);
    }

    #[test]
    fn test_round_trip_reaches_fixed_point() {
        let first = parse_text_plan(RAW_PLAN);
        let second = parse_text_plan(&first.to_text());
        assert_eq!(first, second);

        let messy = "Act I: Calm\nThe town sleeps.\n   Chapter 1: Nobody notices the smoke rising.\n\
            Act II: Storm\n* Chapter 2: The mill burns down overnight.\n* Chapter 3: Everyone blames the miller.\n\
            Act III: After\nChapter 4 - reckoning: The miller is finally proven innocent.";
        let first = parse_text_plan(messy);
        assert_eq!(first.acts.len(), 3);
        let normalized = normalize_text_plan(messy);
        let second = parse_text_plan(&normalized);
        assert_eq!(second.acts.len(), first.acts.len());
        for (a, b) in first.acts.iter().zip(&second.acts) {
            assert_eq!(a.chapters, b.chapters);
        }
        let settled = normalize_text_plan(&normalized);
        assert_eq!(normalize_text_plan(&settled), settled);
    }

    #[test]
    fn test_existing_act_label_is_not_duplicated() {
        let plan = Plan::new(vec![
            Act::new("Act 1: Setup", vec!["The hero wakes up early.".to_string()]),
            Act::new("Rising action", vec!["The hero leaves the village.".to_string()]),
        ]);
        let text = plan.to_text();
        assert!(text.starts_with("Act 1: Setup\n- Chapter 1:"));
        assert!(!text.contains("Act 1:\nAct 1"));
        assert!(text.contains("Act 2:\nRising action\n- Chapter 2: The hero leaves the village."));
    }

    #[test]
    fn test_act_to_text_stops_after_requested_act() {
        let plan = parse_text_plan(RAW_PLAN);
        let (text, chapters) = plan.act_to_text(2);
        assert_eq!(chapters, vec![3, 4]);
        assert!(text.contains("- Chapter 1: The hero wakes up in a small village."));
        assert!(text.contains("- Chapter 4: A betrayal splits the group apart."));
        assert!(!text.contains("Chapter 5"));
        assert!(!text.contains("Resolution"));
        assert_eq!(plan.act_chapter_numbers(2), vec![3, 4]);

        let (full, last) = plan.act_to_text(3);
        assert_eq!(full, plan.to_text());
        assert_eq!(last, vec![5, 6]);
    }

    #[test]
    fn test_scenes_to_text_lists_chapters_with_outlines() {
        let mut plan = parse_text_plan(RAW_PLAN);
        plan.acts[1].chapter_scenes.insert(
            3,
            vec!["Event: Sand swallows the trail.".to_string(), "Event: A well runs dry.".to_string()],
        );
        plan.acts[1].chapter_scenes.insert(9, vec!["Event: Stray chapter.".to_string()]);

        let text = plan.scenes_to_text();
        assert!(text.starts_with("--- ACT 1 ---\n"));
        assert!(text.contains("\n\n--- ACT 2 ---\n"));
        assert!(text.contains(
            "  Chapter 3: The party crosses the burning desert.\n    Scene 1: Event: Sand swallows the trail.\n    Scene 2: Event: A well runs dry."
        ));
        assert!(text.contains("  Chapter 9:\n    Scene 1: Event: Stray chapter."));
        assert!(text.ends_with("  (no scenes)"));
    }

    #[test]
    fn test_parse_act_scenes() {
        let raw = "Chapter 3:\nScene 1:\nCharacters: Ana, Bo\nEvent: The party enters the desert at dawn.\n\
            Scene 2 (night):\nEvent: A sandstorm scatters their camels.\n\n\
            Chapter 4:\nScene 1:\nOk.\nScene 2:\nEvent: Bo steals the map and flees north.";
        let scenes = parse_act_scenes(raw, &[3, 4]);
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[&3].len(), 2);
        assert!(scenes[&3][0].starts_with("Characters: Ana, Bo"));
        assert_eq!(scenes[&3][1], "Event: A sandstorm scatters their camels.");
        assert_eq!(scenes[&4], vec!["Event: Bo steals the map and flees north.".to_string()]);
    }

    #[test]
    fn test_parse_act_scenes_truncates_extra_chapters() {
        let raw = "Chapter 1\nScene 1: An echo of the previous act outline.\n\
            Chapter 3\nScene 1: The party enters the desert at dawn.\n\
            Chapter 4\nScene 1: Bo steals the map and flees north.";
        let scenes = parse_act_scenes(raw, &[3, 4]);
        assert_eq!(scenes.keys().copied().collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn test_parse_act_scenes_keeps_numbers_as_written() {
        let raw = "Chapter 1\nScene 1: The party enters the desert at dawn.\n\
            Chapter 2\nScene 1: Too short.";
        let scenes = parse_act_scenes(raw, &[3, 4]);
        assert_eq!(scenes.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert!(parse_act_scenes("", &[1]).is_empty());
    }

    #[test]
    fn test_prepare_scene_text() {
        assert_eq!(
            prepare_scene_text("Chapter 5, Scene 1\nSome prose.\nChapter 6"),
            "Some prose."
        );
        assert_eq!(
            prepare_scene_text("\nChapter 2\nScene 3: The Duel\n\nSteel rang.\nHe fell.\nScene 4: Aftermath\nMore."),
            "Steel rang.\nHe fell."
        );
        assert_eq!(prepare_scene_text("Plain prose only."), "Plain prose only.");
        assert_eq!(prepare_scene_text("Chapter 1, Scene 1"), "");
    }

    #[test]
    fn test_prepare_scene_text_skips_preamble_before_echo() {
        assert_eq!(
            prepare_scene_text("Title: The Long Night\nChapter 2, Scene 1\nThe rain fell on the docks.\nShe waited."),
            "The rain fell on the docks.\nShe waited."
        );
        assert_eq!(
            prepare_scene_text("Sure, here it is.\n\nChapter 2\nThe harbour was empty.\nScene 1 - Dawn\nGulls circled."),
            "Gulls circled."
        );
    }

    #[test]
    fn test_prepare_scene_text_echo_window_is_five_lines() {
        let text = "Line one.\nLine two.\nLine three.\nLine four.\nLine five.\nAs in Chapter 1, she waited.";
        assert_eq!(prepare_scene_text(text), text);

        let text = "Line one.\nLine two.\nLine three.\nLine four.\nLine five.\nChapter 2, Scene 1\nLater.";
        assert_eq!(
            prepare_scene_text(text),
            "Line one.\nLine two.\nLine three.\nLine four.\nLine five."
        );
    }

    #[test]
    fn test_plan_json_format() {
        let mut plan = parse_text_plan(RAW_PLAN);
        plan.acts[1].act_scenes = Some("raw breakdown".to_string());
        plan.acts[1]
            .chapter_scenes
            .insert(3, vec!["The party enters the desert at dawn.".to_string()]);

        let value = serde_json::to_value(&plan).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["act_descr"], "Act 1: Setup\nThe hero lives a quiet life.");
        assert!(value[0].get("act_scenes").is_none());
        assert_eq!(value[1]["chapter_scenes"]["3"][0], "The party enters the desert at dawn.");

        let restored: Plan = serde_json::from_value(value).unwrap();
        assert_eq!(restored, plan);
        assert_eq!(restored.scene_refs().len(), 1);
        assert_eq!(restored.scene_refs()[0].chapter, 3);
    }
}
