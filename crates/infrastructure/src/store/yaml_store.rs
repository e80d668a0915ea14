use super::atomic::write_atomic;
use async_trait::async_trait;
use domain::{
    AppraisalError, AppraisalResult, AppraisalSettings, AppraisalSnapshot, AttributeRecord,
    CommentSet, ConversationContext, FeedForwardCard, GoalRecord, RecordStore,
    StakeholderContext,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub const GOALS_FILE: &str = "goals.yaml";
pub const ATTRIBUTES_FILE: &str = "attributes.yaml";
pub const STAKEHOLDERS_FILE: &str = "stakeholders.yaml";
pub const FEED_FORWARD_FILE: &str = "feed_forward.yaml";
pub const SETTINGS_FILE: &str = "settings.yaml";
pub const USER_NOTES_FILE: &str = "user_comments.txt";

#[derive(Debug, Default, Serialize, Deserialize)]
struct GoalsFile {
    goals: Vec<GoalRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AttributesFile {
    attributes: Vec<AttributeRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FeedForwardFile {
    #[serde(default)]
    feed_forward: BTreeMap<String, Vec<FeedForwardCard>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    settings: AppraisalSettings,
}

/// Record store backed by one YAML file per category
#[derive(Debug, Clone)]
pub struct YamlRecordStore {
    input_dir: PathBuf,
    output_path: PathBuf,
}

impl YamlRecordStore {
    pub fn new(input_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_path: output_path.into(),
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn input(&self, name: &str) -> PathBuf {
        self.input_dir.join(name)
    }

    async fn read_required(&self, name: &str) -> AppraisalResult<String> {
        let path = self.input(name);
        fs::read_to_string(&path).await.map_err(|e| {
            AppraisalError::malformed(path.display().to_string(), format!("cannot read: {e}"))
        })
    }

    async fn read_optional(&self, name: &str) -> AppraisalResult<Option<String>> {
        let path = self.input(name);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} not found, treating as empty", path.display());
                Ok(None)
            }
            Err(e) => Err(AppraisalError::malformed(
                path.display().to_string(),
                format!("cannot read: {e}"),
            )),
        }
    }

    async fn write_yaml<T: Serialize>(&self, path: &Path, value: &T) -> AppraisalResult<()> {
        let yaml = serde_yaml::to_string(value).map_err(|e| {
            AppraisalError::persistence(path.display().to_string(), e.to_string())
        })?;
        write_atomic(path, yaml.as_bytes()).await
    }
}

fn parse_yaml<T: DeserializeOwned + Default>(name: &str, content: &str) -> AppraisalResult<T> {
    // An empty file deserializes as YAML null
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(content).map_err(|e| AppraisalError::malformed(name, e.to_string()))
}

#[async_trait]
impl RecordStore for YamlRecordStore {
    async fn load_snapshot(&self) -> AppraisalResult<AppraisalSnapshot> {
        let goals: GoalsFile = parse_yaml(GOALS_FILE, &self.read_required(GOALS_FILE).await?)?;
        for goal in &goals.goals {
            goal.validate()
                .map_err(|reason| AppraisalError::malformed(GOALS_FILE, reason))?;
        }

        let attributes: AttributesFile =
            parse_yaml(ATTRIBUTES_FILE, &self.read_required(ATTRIBUTES_FILE).await?)?;
        for attribute in &attributes.attributes {
            attribute
                .validate()
                .map_err(|reason| AppraisalError::malformed(ATTRIBUTES_FILE, reason))?;
        }

        let stakeholders: StakeholderContext = match self.read_optional(STAKEHOLDERS_FILE).await? {
            Some(content) => parse_yaml(STAKEHOLDERS_FILE, &content)?,
            None => StakeholderContext::default(),
        };
        let feed_forward: FeedForwardFile = match self.read_optional(FEED_FORWARD_FILE).await? {
            Some(content) => parse_yaml(FEED_FORWARD_FILE, &content)?,
            None => FeedForwardFile::default(),
        };
        let settings: SettingsFile = match self.read_optional(SETTINGS_FILE).await? {
            Some(content) => parse_yaml(SETTINGS_FILE, &content)?,
            None => SettingsFile::default(),
        };
        let user_notes = self
            .read_optional(USER_NOTES_FILE)
            .await?
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());

        let snapshot = AppraisalSnapshot {
            goals: goals.goals,
            attributes: attributes.attributes,
            stakeholders,
            conversation: ConversationContext {
                feed_forward: feed_forward.feed_forward,
                user_notes,
            },
            settings: settings.settings,
        };
        snapshot.check_unique_ids()?;

        info!(
            goals = snapshot.goals.len(),
            attributes = snapshot.attributes.len(),
            stakeholders = snapshot.stakeholders.stakeholders.len(),
            "Loaded records from {}",
            self.input_dir.display()
        );
        Ok(snapshot)
    }

    async fn save_snapshot(&self, snapshot: &AppraisalSnapshot) -> AppraisalResult<()> {
        snapshot.check_unique_ids()?;

        self.write_yaml(
            &self.input(GOALS_FILE),
            &GoalsFile {
                goals: snapshot.goals.clone(),
            },
        )
        .await?;
        self.write_yaml(
            &self.input(ATTRIBUTES_FILE),
            &AttributesFile {
                attributes: snapshot.attributes.clone(),
            },
        )
        .await?;
        self.write_yaml(&self.input(STAKEHOLDERS_FILE), &snapshot.stakeholders)
            .await?;
        self.write_yaml(
            &self.input(FEED_FORWARD_FILE),
            &FeedForwardFile {
                feed_forward: snapshot.conversation.feed_forward.clone(),
            },
        )
        .await?;
        self.write_yaml(
            &self.input(SETTINGS_FILE),
            &SettingsFile {
                settings: snapshot.settings.clone(),
            },
        )
        .await?;

        // user_comments.txt is written by the associate and never overwritten
        info!("Saved extracted records to {}", self.input_dir.display());
        Ok(())
    }

    async fn write_comments(&self, comments: &CommentSet) -> AppraisalResult<()> {
        self.write_yaml(&self.output_path, comments).await?;
        info!(
            count = comments.len(),
            "Wrote comments to {}",
            self.output_path.display()
        );
        Ok(())
    }

    async fn load_comments(&self) -> AppraisalResult<Option<CommentSet>> {
        match fs::read_to_string(&self.output_path).await {
            Ok(content) => {
                let name = self.output_path.display().to_string();
                Ok(Some(parse_yaml(&name, &content)?))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppraisalError::malformed(
                self.output_path.display().to_string(),
                format!("cannot read: {e}"),
            )),
        }
    }
}
