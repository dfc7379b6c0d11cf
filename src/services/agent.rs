//! The generation stages: book spec, plot, act enhancement, scene breakdown
//! and scene prose.
//!
//! Every stage asks the generator again when its output does not parse into
//! the structure the next stage needs, up to `max_attempts` times.

use crate::core::book_spec::{BookSpec, SpecField};
use crate::core::config::GenerationConfig;
use crate::core::error::StoryError;
use crate::core::plan::{self, Plan};
use crate::services::llm::{Message, TextGenerator};
use crate::services::prompts;
use crate::utils::text::keep_last_n_words;
use anyhow::Result;
use log::{debug, info, warn};

/// Minimum chapters an enhanced act must keep.
const MIN_ENHANCED_CHAPTERS: usize = 2;

fn preview(text: &str) -> String {
    text.chars().take(500).collect()
}

#[derive(Debug)]
pub struct StoryAgent {
    generator: Box<dyn TextGenerator>,
    form: String,
    max_attempts: usize,
    n_crop_previous: usize,
}

impl StoryAgent {
    pub fn new(generator: Box<dyn TextGenerator>, form: impl Into<String>, generation: &GenerationConfig) -> Self {
        Self {
            generator,
            form: form.into(),
            max_attempts: generation.max_attempts.max(1),
            n_crop_previous: generation.n_crop_previous,
        }
    }

    async fn query(&self, stage: &str, messages: &[Message]) -> Result<String> {
        for message in messages {
            debug!("[{}] {}: {}", stage, message.role.as_str(), message.content);
        }
        let text = self.generator.generate(messages).await?;
        debug!("[{}] generated {} chars", stage, text.len());
        Ok(text)
    }

    fn exhausted(&self, stage: impl Into<String>) -> anyhow::Error {
        StoryError::unparseable(stage, self.max_attempts).into()
    }

    /// Creates the book spec, then requests every field the first answer
    /// left empty, one field at a time in field order.
    pub async fn init_book_spec(&self, topic: &str) -> Result<BookSpec> {
        info!("Creating book spec for topic: {}", topic);
        let messages = prompts::init_book_spec(topic, &self.form);
        let text = self.query("init_book_spec", &messages).await?;
        let mut spec = BookSpec::parse(&text);

        for field in spec.missing_fields() {
            self.fill_field(&mut spec, field).await?;
        }
        Ok(spec)
    }

    async fn fill_field(&self, spec: &mut BookSpec, field: SpecField) -> Result<()> {
        info!("Book spec is missing {}, requesting it", field);
        let messages = prompts::missing_book_spec(field, &spec.to_text());
        for attempt in 1..=self.max_attempts {
            let reply = self.query("missing_book_spec", &messages).await?;
            if let Some(value) = BookSpec::parse_field_reply(&reply, field) {
                spec.set(field, value);
                return Ok(());
            }
            warn!(
                "Attempt {}/{}: no {} in reply: {}",
                attempt,
                self.max_attempts,
                field,
                preview(&reply)
            );
        }
        Err(self.exhausted(format!("book spec field {}", field)))
    }

    /// Rewrites the spec in more detail. Fields the new version lacks keep
    /// their old value.
    pub async fn enhance_book_spec(&self, spec: &BookSpec) -> Result<BookSpec> {
        let messages = prompts::enhance_book_spec(&spec.to_text(), &self.form);
        for attempt in 1..=self.max_attempts {
            let text = self.query("enhance_book_spec", &messages).await?;
            if text.trim().is_empty() {
                warn!("Attempt {}/{}: empty book spec enhancement", attempt, self.max_attempts);
                continue;
            }
            let mut enhanced = BookSpec::parse(&text);
            enhanced.fill_missing_from(spec);
            return Ok(enhanced);
        }
        Err(self.exhausted("enhance_book_spec"))
    }

    pub async fn create_plot_chapters(&self, spec: &BookSpec) -> Result<Plan> {
        let messages = prompts::create_plot_chapters(&spec.to_text(), &self.form);
        for attempt in 1..=self.max_attempts {
            let text = self.query("create_plot_chapters", &messages).await?;
            let plan = plan::parse_text_plan(&text);
            if plan.is_complete() {
                return Ok(plan);
            }
            warn!(
                "Attempt {}/{}: plot parsed into {} acts: {}",
                attempt,
                self.max_attempts,
                plan.acts.len(),
                preview(&text)
            );
        }
        Err(self.exhausted("create_plot_chapters"))
    }

    /// Rewrites the acts one after another. Each request sees the plan as
    /// already updated by the previous acts.
    pub async fn enhance_plot_chapters(&self, spec: &BookSpec, mut plan: Plan) -> Result<Plan> {
        let text_spec = spec.to_text();
        let mut text_plan = plan.to_text();
        for act_num in 1..=plan.acts.len() {
            info!("Enhancing act {}", act_num);
            let messages = prompts::enhance_plot_chapters(act_num, &text_plan, &text_spec, &self.form);
            let act = self.regenerate_act(act_num, &messages).await?;
            plan.set_act(act_num, act);
            text_plan = plan.to_text();
        }
        Ok(plan)
    }

    async fn regenerate_act(&self, act_num: usize, messages: &[Message]) -> Result<plan::Act> {
        for attempt in 1..=self.max_attempts {
            let text = self.query("enhance_plot_chapters", messages).await?;
            let act = plan::parse_act(&text);
            if act.chapters.len() >= MIN_ENHANCED_CHAPTERS {
                return Ok(act);
            }
            warn!(
                "Attempt {}/{}: act {} came back with {} chapters: {}",
                attempt,
                self.max_attempts,
                act_num,
                act.chapters.len(),
                preview(&text)
            );
        }
        Err(self.exhausted(format!("enhance_plot_chapters act {}", act_num)))
    }

    /// Requests a scene breakdown per act, stores it raw in `act_scenes`, then
    /// parses every act's breakdown into `chapter_scenes`.
    pub async fn split_chapters_into_scenes(&self, mut plan: Plan) -> Result<Plan> {
        for act_num in 1..=plan.acts.len() {
            info!("Breaking act {} into scenes", act_num);
            let (text_act, chapters) = plan.act_to_text(act_num);
            let messages = prompts::split_chapters_into_scenes(act_num, &text_act, &self.form);
            let raw = self.request_breakdown(act_num, &chapters, &messages).await?;
            plan.acts[act_num - 1].act_scenes = Some(raw);
        }

        for act_num in 1..=plan.acts.len() {
            let chapters = plan.act_chapter_numbers(act_num);
            let act = &mut plan.acts[act_num - 1];
            let raw = act.act_scenes.as_deref().unwrap_or_default();
            act.chapter_scenes = plan::parse_act_scenes(raw, &chapters);
        }
        Ok(plan)
    }

    async fn request_breakdown(&self, act_num: usize, chapters: &[usize], messages: &[Message]) -> Result<String> {
        for attempt in 1..=self.max_attempts {
            let raw = self.query("split_chapters_into_scenes", messages).await?;
            if !plan::parse_act_scenes(&raw, chapters).is_empty() {
                return Ok(raw);
            }
            warn!(
                "Attempt {}/{}: no scenes found for act {}: {}",
                attempt,
                self.max_attempts,
                act_num,
                preview(&raw)
            );
        }
        Err(self.exhausted(format!("split_chapters_into_scenes act {}", act_num)))
    }

    /// Writes one scene, optionally continuing from the end of the previous one.
    pub async fn write_a_scene(
        &self,
        scene: &str,
        sc_num: usize,
        ch_num: usize,
        plan: &Plan,
        previous_scene: Option<&str>,
    ) -> Result<String> {
        self.scene_with_context(scene, sc_num, ch_num, plan, previous_scene, prompts::PREV_SCENE_INTRO)
            .await
    }

    /// Writes the next stretch of a scene that is already partly written.
    pub async fn continue_a_scene(
        &self,
        scene: &str,
        sc_num: usize,
        ch_num: usize,
        plan: &Plan,
        current_scene: Option<&str>,
    ) -> Result<String> {
        self.scene_with_context(scene, sc_num, ch_num, plan, current_scene, prompts::CUR_SCENE_INTRO)
            .await
    }

    async fn scene_with_context(
        &self,
        scene: &str,
        sc_num: usize,
        ch_num: usize,
        plan: &Plan,
        context: Option<&str>,
        intro: &str,
    ) -> Result<String> {
        let mut messages = prompts::scene(scene, sc_num, ch_num, &plan.to_text(), &self.form);
        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            let excerpt = keep_last_n_words(context, self.n_crop_previous);
            prompts::append_excerpt(&mut messages, intro, &excerpt);
        }
        let raw = self.query("scene", &messages).await?;
        Ok(plan::prepare_scene_text(&raw))
    }

    /// Like [`write_a_scene`](Self::write_a_scene), but asks again while the
    /// cleaned text comes back empty.
    pub async fn write_scene(
        &self,
        scene: &str,
        sc_num: usize,
        ch_num: usize,
        plan: &Plan,
        previous_scene: Option<&str>,
    ) -> Result<String> {
        for attempt in 1..=self.max_attempts {
            let text = self.write_a_scene(scene, sc_num, ch_num, plan, previous_scene).await?;
            if !text.is_empty() {
                return Ok(text);
            }
            warn!(
                "Attempt {}/{}: chapter {} scene {} came back empty",
                attempt, self.max_attempts, ch_num, sc_num
            );
        }
        Err(self.exhausted(format!("scene {} of chapter {}", sc_num, ch_num)))
    }

    /// Runs every stage and returns the scene texts in reading order.
    pub async fn generate_story(&self, topic: &str) -> Result<Vec<String>> {
        let spec = self.init_book_spec(topic).await?;
        let spec = self.enhance_book_spec(&spec).await?;
        let plan = self.create_plot_chapters(&spec).await?;
        let plan = self.enhance_plot_chapters(&spec, plan).await?;
        let plan = self.split_chapters_into_scenes(plan).await?;

        let mut scenes: Vec<String> = Vec::new();
        for scene in plan.scene_refs() {
            let previous = scenes.last().map(String::as_str);
            let text = self
                .write_scene(scene.description, scene.scene, scene.chapter, &plan, previous)
                .await?;
            scenes.push(text);
        }
        Ok(scenes)
    }
}
