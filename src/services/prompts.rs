//! Conversation builders for each generation stage.

use crate::core::book_spec::{BookSpec, SpecField};
use crate::services::llm::{Message, Role};

pub const SYSTEM: &str = "You are a helpful assistant for fiction writing. \
    Always cut the bullshit and provide concise outlines with useful details. \
    Do not turn your stories into fairy tales, be realistic.";

const SCENE_WRITER_SYSTEM: &str = "You are an expert fiction writer. Write detailed scenes with lively dialogue.";

pub const SCENE_SPEC_FORMAT: &str = "Chapter [number]:\n\
    Scene [number]:\n\
    Characters: character list\n\
    Place: place\n\
    Time: absolute or relative time\n\
    Event: what happens\n\
    Conflict: scene micro-conflict\n\
    Story value: story value affected by the scene\n\
    Story value charge: the charge of story value by the end of the scene (positive or negative)\n\
    Mood: mood\n\
    Outcome: the result.";

pub const PREV_SCENE_INTRO: &str = "\n\nHere is the ending of the previous scene:\n";
pub const CUR_SCENE_INTRO: &str = "\n\nHere is the last written snippet of the current scene:\n";

fn plot_request(book_spec: &str, form: &str) -> String {
    format!(
        "Come up with a plot for a bestseller-grade {form} in 3 acts. \
         Break down the plot into chapters using the following structure:\nActs\n- Chapters\n\n\
         Early {form} description:\n\"\"\"{book_spec}\"\"\""
    )
}

pub fn init_book_spec(topic: &str, form: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM),
        Message::user(format!(
            "Given the topic, come up with a specification to write a {form}. \
             Write spec using the format below. Topic: {topic}\nFormat:\n\"\"\"\n{}\"\"\"",
            BookSpec::format_template()
        )),
    ]
}

pub fn missing_book_spec(field: SpecField, text_spec: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM),
        Message::user(format!(
            "Given a hypothetical book spec, fill the missing field: {field}. \
             Return only field, separator and value in one line like \"Field: value\".\n\
             Book spec:\n\"\"\"{text_spec}\"\"\""
        )),
    ]
}

pub fn enhance_book_spec(book_spec: &str, form: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM),
        Message::user(format!(
            "Make the specification for an upcoming {form} more detailed \
             (specific settings, major events that differentiate the {form} from others). \
             Do not change the format or add more fields.\n\
             Early {form} specification:\n\"\"\"{book_spec}\"\"\""
        )),
    ]
}

pub fn create_plot_chapters(book_spec: &str, form: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM),
        Message::user(format!(
            "Come up with a plot for a bestseller-grade {form} in 3 acts taking inspiration from its description. \
             Break down the plot into chapters using the following structure:\nActs\n- Chapters\n\n\
             Early {form} description:\n\"\"\"{book_spec}\"\"\"."
        )),
    ]
}

/// `act_num` is 1-based. The current plan is replayed as the assistant's
/// previous answer.
pub fn enhance_plot_chapters(act_num: usize, text_plan: &str, book_spec: &str, form: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM),
        Message::user(plot_request(book_spec, form)),
        Message::assistant(text_plan),
        Message::user(format!(
            "Take Act {act_num}. Rewrite the plan so that chapter's story value alternates \
             (i.e. if Chapter 1 is positive, Chapter 2 is negative, and so on). \
             Describe only concrete events and actions (who did what). \
             Make it very short (one brief sentence and value charge indication per chapter)"
        )),
    ]
}

pub fn split_chapters_into_scenes(act_num: usize, text_act: &str, form: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM),
        Message::user(format!(
            "Break each chapter in Act {act_num} into scenes (number depends on how packed a chapter is), \
             give scene specifications for each.\n\
             Here is the by-chapter plot summary for the act in a {form}:\n\"\"\"{text_act}\"\"\"\n\n\
             Scene spec format:\n\"\"\"{SCENE_SPEC_FORMAT}\"\"\""
        )),
    ]
}

/// Ends with an assistant prefill naming the chapter and scene, which the
/// generator tends to echo back.
pub fn scene(scene: &str, sc_num: usize, ch_num: usize, text_plan: &str, form: &str) -> Vec<Message> {
    vec![
        Message::system(SCENE_WRITER_SYSTEM),
        Message::user(format!(
            "Write a long detailed scene for a {form} for scene {sc_num} in chapter {ch_num} based on the information. \
             Be creative, explore interesting characters and unusual settings. Do NOT use foreshadowing.\n\
             Here is the scene specification:\n\"\"\"{scene}\"\"\"\n\n\
             Here is the overall plot:\n\"\"\"{text_plan}\"\"\""
        )),
        Message::assistant(format!("\nChapter {ch_num}, Scene {sc_num}\n")),
    ]
}

/// Appends a fenced excerpt to the first user message.
pub fn append_excerpt(messages: &mut [Message], intro: &str, excerpt: &str) {
    if let Some(user) = messages.iter_mut().find(|m| m.role == Role::User) {
        user.content.push_str(intro);
        user.content.push_str("\"\"\"");
        user.content.push_str(excerpt);
        user.content.push_str("\"\"\"");
    }
}
