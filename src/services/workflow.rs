use crate::core::book_spec::BookSpec;
use crate::core::config::Config;
use crate::core::io::Storage;
use crate::core::plan::{normalize_text_plan, parse_text_plan, Plan, SceneRef};
use crate::core::state::WorkflowState;
use crate::services::agent::StoryAgent;
use crate::services::llm::TextGenerator;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

pub const BOOK_SPEC_INITIAL: &str = "01_book_spec_initial.txt";
pub const BOOK_SPEC_ENHANCED: &str = "02_book_spec_enhanced.txt";
pub const PLAN_INITIAL: &str = "03_plan_initial.json";
pub const PLAN_ENHANCED: &str = "04_plan_enhanced.json";
pub const PLAN_SCENES: &str = "05_plan_scenes.json";
pub const PLAN_INITIAL_TEXT: &str = "03_plot_chapters_initial.txt";
pub const PLAN_ENHANCED_TEXT: &str = "04_plot_chapters_enhanced.txt";
pub const SCENES_READABLE: &str = "05_scenes_breakdown_readable.txt";
pub const STORY_FILE: &str = "story.txt";

/// Stage output stored in the build folder between runs.
trait Checkpoint: Sized {
    fn encode(&self) -> Result<String>;
    fn decode(text: &str) -> Result<Self>;
}

impl Checkpoint for BookSpec {
    fn encode(&self) -> Result<String> {
        Ok(self.to_text())
    }

    fn decode(text: &str) -> Result<Self> {
        Ok(BookSpec::parse(text))
    }
}

impl Checkpoint for Plan {
    fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn decode(text: &str) -> Result<Self> {
        let plan: Plan = serde_json::from_str(text)?;
        if !plan.is_complete() {
            anyhow::bail!("plan holds {} acts instead of 3", plan.acts.len());
        }
        Ok(plan)
    }
}

fn scene_key(scene: &SceneRef<'_>) -> String {
    format!("act{}_ch{}_sc{}", scene.act, scene.chapter, scene.scene)
}

pub struct WorkflowManager {
    config: Config,
    agent: StoryAgent,
    state: WorkflowState,
    storage: Arc<dyn Storage>,
}

impl WorkflowManager {
    pub async fn new(config: Config, generator: Box<dyn TextGenerator>, storage: Arc<dyn Storage>) -> Result<Self> {
        let state = Self::load_state(&config.build_folder, storage.as_ref()).await?;
        let agent = StoryAgent::new(generator, config.form.clone(), &config.generation);
        Ok(Self {
            config,
            agent,
            state,
            storage,
        })
    }

    fn build_path(&self, name: &str) -> String {
        Path::new(&self.config.build_folder)
            .join(name)
            .to_string_lossy()
            .into_owned()
    }

    async fn load_state(build_dir: &str, storage: &dyn Storage) -> Result<WorkflowState> {
        let path = Path::new(build_dir).join("state.json");
        let path_str = path.to_string_lossy();
        if storage.exists(&path_str).await? {
            let content = storage.read_text(&path_str).await?;
            serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path_str))
        } else {
            Ok(WorkflowState::default())
        }
    }

    async fn save_state(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.state)?;
        self.storage
            .write_text(&self.build_path("state.json"), &content)
            .await
    }

    async fn load<T: Checkpoint>(&self, name: &str) -> Result<Option<T>> {
        let path = self.build_path(name);
        if !self.storage.exists(&path).await? {
            return Ok(None);
        }
        println!("Loading cached {}", path);
        let text = self.storage.read_text(&path).await?;
        let value = T::decode(&text).with_context(|| format!("Failed to load checkpoint {}", path))?;
        Ok(Some(value))
    }

    /// Loads an outline stage. The editable text file wins over the JSON copy;
    /// whichever one is read, the other is rewritten to match.
    async fn load_plan(&self, name: &str, text_name: &str) -> Result<Option<Plan>> {
        let text_path = self.build_path(text_name);
        if !self.storage.exists(&text_path).await? {
            let plan = self.load::<Plan>(name).await?;
            if let Some(plan) = &plan {
                self.storage.write_text(&text_path, &plan.to_text()).await?;
            }
            return Ok(plan);
        }

        println!("Loading cached {}", text_path);
        let text = self.storage.read_text(&text_path).await?;
        let canonical = normalize_text_plan(&text);
        let plan = parse_text_plan(&canonical);
        if !plan.is_complete() {
            anyhow::bail!(
                "Failed to load checkpoint {}: plan holds {} acts instead of 3",
                text_path,
                plan.acts.len()
            );
        }
        if canonical != text.trim() {
            debug!("Normalized edited outline {}", text_path);
            self.storage.write_text(&text_path, &canonical).await?;
        }
        self.storage.write_text(&self.build_path(name), &plan.encode()?).await?;
        Ok(Some(plan))
    }

    /// Asks whether to go on after the user had a chance to edit `path`.
    fn confirm_continue(&self, path: &str) -> bool {
        println!("Review or edit {} before continuing.", path);
        let ans = inquire::Confirm::new("Continue to next stage?")
            .with_default(true)
            .prompt();
        match ans {
            Ok(true) => true,
            Ok(false) => {
                println!("Stopping as requested.");
                false
            }
            Err(_) => {
                println!("Error reading input, stopping.");
                false
            }
        }
    }

    /// Stores a stage result. Outside unattended mode the user can edit the
    /// file before confirming; the edited version is what later stages see.
    /// Returns `None` when the user chose to stop.
    async fn checkpoint<T: Checkpoint>(&self, name: &str, value: T) -> Result<Option<T>> {
        let path = self.build_path(name);
        self.storage.write_text(&path, &value.encode()?).await?;
        info!("Saved checkpoint {}", path);

        if self.config.unattended {
            return Ok(Some(value));
        }
        if !self.confirm_continue(&path) {
            return Ok(None);
        }
        self.load(name).await
    }

    /// Stores an outline as JSON and as editable text. After review the plan
    /// is reparsed from the text file.
    async fn checkpoint_plan(&self, name: &str, text_name: &str, plan: Plan) -> Result<Option<Plan>> {
        let text_path = self.build_path(text_name);
        self.storage.write_text(&self.build_path(name), &plan.encode()?).await?;
        self.storage.write_text(&text_path, &plan.to_text()).await?;
        info!("Saved checkpoint {}", text_path);

        if self.config.unattended {
            return Ok(Some(plan));
        }
        if !self.confirm_continue(&text_path) {
            return Ok(None);
        }
        self.load_plan(name, text_name).await
    }

    /// Runs every stage, reusing checkpoints left by earlier runs, and writes
    /// the assembled story to the output folder.
    pub async fn run(&mut self, topic: &str) -> Result<()> {
        let spec = match self.load::<BookSpec>(BOOK_SPEC_INITIAL).await? {
            Some(spec) => spec,
            None => {
                println!("Creating book spec...");
                let spec = self.agent.init_book_spec(topic).await?;
                match self.checkpoint(BOOK_SPEC_INITIAL, spec).await? {
                    Some(spec) => spec,
                    None => return Ok(()),
                }
            }
        };

        let spec = match self.load::<BookSpec>(BOOK_SPEC_ENHANCED).await? {
            Some(spec) => spec,
            None => {
                println!("Enhancing book spec...");
                let enhanced = self.agent.enhance_book_spec(&spec).await?;
                match self.checkpoint(BOOK_SPEC_ENHANCED, enhanced).await? {
                    Some(spec) => spec,
                    None => return Ok(()),
                }
            }
        };

        let plan = match self.load_plan(PLAN_INITIAL, PLAN_INITIAL_TEXT).await? {
            Some(plan) => plan,
            None => {
                println!("Creating plot outline...");
                let plan = self.agent.create_plot_chapters(&spec).await?;
                match self.checkpoint_plan(PLAN_INITIAL, PLAN_INITIAL_TEXT, plan).await? {
                    Some(plan) => plan,
                    None => return Ok(()),
                }
            }
        };

        let plan = match self.load_plan(PLAN_ENHANCED, PLAN_ENHANCED_TEXT).await? {
            Some(plan) => plan,
            None => {
                println!("Enhancing plot outline...");
                let plan = self.agent.enhance_plot_chapters(&spec, plan).await?;
                match self.checkpoint_plan(PLAN_ENHANCED, PLAN_ENHANCED_TEXT, plan).await? {
                    Some(plan) => plan,
                    None => return Ok(()),
                }
            }
        };

        let plan = match self.load::<Plan>(PLAN_SCENES).await? {
            Some(plan) => plan,
            None => {
                println!("Breaking chapters into scenes...");
                let plan = self.agent.split_chapters_into_scenes(plan).await?;
                self.storage
                    .write_text(&self.build_path(SCENES_READABLE), &plan.scenes_to_text())
                    .await?;
                match self.checkpoint(PLAN_SCENES, plan).await? {
                    Some(plan) => plan,
                    None => return Ok(()),
                }
            }
        };

        let scenes = self.write_scenes(&plan).await?;
        let story_path = self.assemble_story(&plan, &scenes).await?;
        println!("Story complete: {}", story_path);
        Ok(())
    }

    /// Writes every scene not yet recorded in `state.json`, in reading order.
    async fn write_scenes(&mut self, plan: &Plan) -> Result<Vec<String>> {
        let scene_refs = plan.scene_refs();
        println!("Writing {} scenes...", scene_refs.len());

        let pb = ProgressBar::new(scene_refs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );

        let written = self.storage.list(&self.build_path("scenes")).await?;
        let mut texts: Vec<String> = Vec::with_capacity(scene_refs.len());
        for scene in &scene_refs {
            let key = scene_key(scene);
            let path = self.build_path(&format!("scenes/{}.txt", key));

            if self.state.is_done(&key) && written.contains(&path) {
                texts.push(self.storage.read_text(&path).await?);
                pb.inc(1);
                continue;
            }

            let previous = texts.last().map(String::as_str);
            let text = self
                .agent
                .write_scene(scene.description, scene.scene, scene.chapter, plan, previous)
                .await?;
            self.storage.write_text(&path, &text).await?;
            self.state.mark_done(key);
            self.save_state().await?;
            texts.push(text);
            pb.inc(1);
        }

        pb.finish_with_message("Scenes complete");
        Ok(texts)
    }

    async fn assemble_story(&self, plan: &Plan, scenes: &[String]) -> Result<String> {
        let mut story = String::new();
        let mut current_chapter = None;
        for (scene, text) in plan.scene_refs().iter().zip(scenes) {
            if current_chapter != Some(scene.chapter) {
                if !story.is_empty() {
                    story.push_str("\n\n");
                }
                story.push_str(&format!("Chapter {}\n\n", scene.chapter));
                current_chapter = Some(scene.chapter);
            } else {
                story.push_str("\n\n");
            }
            story.push_str(text);
        }
        story.push('\n');

        let path = Path::new(&self.config.output_folder)
            .join(STORY_FILE)
            .to_string_lossy()
            .into_owned();
        self.storage.write_text(&path, &story).await?;
        Ok(path)
    }
}
