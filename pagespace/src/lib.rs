//! Workspace document library: a forest of pages owning block trees, plus flat task and
//! goal collections. The core stays a plain value model; `store` is the only mutation
//! surface, and read models, editor helpers and the simulated assistant sit on top of it.

pub mod core {
    use chrono::{DateTime, Duration, NaiveDate, Utc};
    use serde::{Deserialize, Serialize};
    use serde_with::skip_serializing_none;
    use std::{collections::BTreeSet, fmt, str::FromStr};

    /// Icon shown for pages that do not carry one.
    pub const DEFAULT_PAGE_ICON: &str = "📄";

    /* ------------------------------- IDs ------------------------------- */

    /// Declares a string-backed identifier. Seed data uses readable ids (`page-1`), freshly
    /// created entities get `<kind>-<uuid>`.
    macro_rules! string_id {
        ($(#[$meta:meta])* $name:ident, $kind:literal) => {
            $(#[$meta])*
            #[derive(
                Debug,
                Clone,
                PartialEq,
                Eq,
                PartialOrd,
                Ord,
                Hash,
                ::serde::Serialize,
                ::serde::Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub String);

            impl $name {
                pub fn generate() -> Self {
                    Self(format!("{}-{}", $kind, ::uuid::Uuid::new_v4().simple()))
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl From<&str> for $name {
                fn from(s: &str) -> Self {
                    Self(s.to_string())
                }
            }

            impl ::std::fmt::Display for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.write_str(&self.0)
                }
            }
        };
    }
    pub(crate) use string_id;

    string_id!(PageId, "page");
    string_id!(BlockId, "block");
    string_id!(TaskId, "task");
    string_id!(GoalId, "goal");

    /* ------------------------------ Blocks ------------------------------ */

    /// Closed set of block kinds understood by the editor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum BlockType {
        Text,
        Heading1,
        Heading2,
        Heading3,
        Todo,
        Toggle,
        Code,
        Divider,
        Quote,
    }

    impl BlockType {
        pub const ALL: [BlockType; 9] = [
            BlockType::Text,
            BlockType::Heading1,
            BlockType::Heading2,
            BlockType::Heading3,
            BlockType::Todo,
            BlockType::Toggle,
            BlockType::Code,
            BlockType::Divider,
            BlockType::Quote,
        ];

        pub fn as_str(self) -> &'static str {
            match self {
                BlockType::Text => "text",
                BlockType::Heading1 => "heading1",
                BlockType::Heading2 => "heading2",
                BlockType::Heading3 => "heading3",
                BlockType::Todo => "todo",
                BlockType::Toggle => "toggle",
                BlockType::Code => "code",
                BlockType::Divider => "divider",
                BlockType::Quote => "quote",
            }
        }

        /// Hint shown by the editor for an empty block of this kind.
        pub fn placeholder(self) -> &'static str {
            match self {
                BlockType::Heading1 => "Heading 1",
                BlockType::Heading2 => "Heading 2",
                BlockType::Heading3 => "Heading 3",
                BlockType::Todo => "To-do",
                BlockType::Quote => "Quote",
                BlockType::Code => "Code",
                _ => "Type something...",
            }
        }
    }

    impl fmt::Display for BlockType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for BlockType {
        type Err = DomainError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            BlockType::ALL
                .into_iter()
                .find(|t| t.as_str().eq_ignore_ascii_case(s))
                .ok_or_else(|| DomainError::UnknownBlockType(s.to_string()))
        }
    }

    /// A content node inside a page. Toggles nest their content in `children`.
    #[skip_serializing_none]
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Block {
        pub id: BlockId,
        #[serde(rename = "type")]
        pub block_type: BlockType,
        /// Text payload; empty for dividers.
        #[serde(default)]
        pub content: String,
        /// Only meaningful for `todo` blocks.
        pub checked: Option<bool>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub children: Vec<Block>,
        /// Language of a `code` block.
        pub language: Option<String>,
    }

    impl Block {
        pub fn new(id: BlockId, block_type: BlockType, content: impl Into<String>) -> Self {
            Self {
                id,
                block_type,
                content: content.into(),
                checked: (block_type == BlockType::Todo).then_some(false),
                children: vec![],
                language: None,
            }
        }

        pub fn todo(id: BlockId, content: impl Into<String>, checked: bool) -> Self {
            let mut block = Self::new(id, BlockType::Todo, content);
            block.checked = Some(checked);
            block
        }

        pub fn divider(id: BlockId) -> Self {
            Self::new(id, BlockType::Divider, "")
        }

        pub fn with_children(mut self, children: Vec<Block>) -> Self {
            self.children = children;
            self
        }

        pub fn with_language(mut self, language: impl Into<String>) -> Self {
            self.language = Some(language.into());
            self
        }

        pub fn is_checked(&self) -> bool {
            self.checked.unwrap_or(false)
        }
    }

    /* ------------------------------- Pages ------------------------------- */

    /// A titled document owning an ordered block sequence and optional sub-pages.
    #[skip_serializing_none]
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Page {
        pub id: PageId,
        pub title: String,
        pub icon: Option<String>,
        pub cover_image: Option<String>,
        #[serde(default)]
        pub blocks: Vec<Block>,
        /// Owned sub-pages; each child's `parent_id` points back here.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub children: Vec<Page>,
        /// Lookup-only back reference; ownership is the parent's `children`.
        pub parent_id: Option<PageId>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    impl Page {
        pub fn new(id: PageId, title: impl Into<String>) -> Self {
            let now = Utc::now();
            Self {
                id,
                title: title.into(),
                icon: None,
                cover_image: None,
                blocks: vec![],
                children: vec![],
                parent_id: None,
                created_at: now,
                updated_at: now,
            }
        }

        pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
            self.icon = Some(icon.into());
            self
        }

        pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
            self.blocks = blocks;
            self
        }

        /// Adopts `child` as the last sub-page, wiring its back reference.
        pub fn with_child(mut self, mut child: Page) -> Self {
            child.parent_id = Some(self.id.clone());
            self.children.push(child);
            self
        }

        pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
            self.created_at = created_at;
            self.updated_at = updated_at;
            self
        }

        pub fn display_icon(&self) -> &str {
            self.icon.as_deref().unwrap_or(DEFAULT_PAGE_ICON)
        }

        /// Refresh `updated_at`. The new stamp is always strictly later than the old one,
        /// even when the clock has not advanced since the previous mutation.
        pub fn touch(&mut self) {
            let now = Utc::now();
            self.updated_at = if now > self.updated_at {
                now
            } else {
                self.updated_at + Duration::microseconds(1)
            };
        }

        /// Depth-first walk over this page and its descendants (parent first).
        pub fn walk<'a>(&'a self, out: &mut Vec<&'a Page>) {
            out.push(self);
            for child in &self.children {
                child.walk(out);
            }
        }
    }

    /* --------------------------- Tasks and goals --------------------------- */

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Priority {
        Low,
        Medium,
        High,
    }

    impl fmt::Display for Priority {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Priority::Low => "low",
                Priority::Medium => "medium",
                Priority::High => "high",
            })
        }
    }

    /// Flat to-do item. `page_id` and `goal_id` are lookup keys, not ownership.
    #[skip_serializing_none]
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Task {
        pub id: TaskId,
        pub title: String,
        #[serde(default)]
        pub completed: bool,
        pub priority: Priority,
        pub due_date: Option<NaiveDate>,
        pub page_id: Option<PageId>,
        pub goal_id: Option<GoalId>,
    }

    impl Task {
        pub fn new(id: TaskId, title: impl Into<String>, priority: Priority) -> Self {
            Self {
                id,
                title: title.into(),
                completed: false,
                priority,
                due_date: None,
                page_id: None,
                goal_id: None,
            }
        }
    }

    /// A tracked objective. `progress` is caller supplied and never derived from tasks.
    #[skip_serializing_none]
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Goal {
        pub id: GoalId,
        pub title: String,
        #[serde(default)]
        pub description: String,
        /// Percentage, 0..=100.
        #[serde(default)]
        pub progress: u8,
        /// Snapshot of linked tasks taken when the goal was read.
        #[serde(default)]
        pub tasks: Vec<Task>,
        pub due_date: Option<NaiveDate>,
    }

    /* ------------------------------ Aggregate ------------------------------ */

    /// Aggregate root for one session: the page forest plus flat tasks and goals.
    #[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Workspace {
        #[serde(default)]
        pub pages: Vec<Page>,
        #[serde(default)]
        pub tasks: Vec<Task>,
        #[serde(default)]
        pub goals: Vec<Goal>,
    }

    impl Workspace {
        /// Every page in document order (depth-first, parent before children).
        pub fn all_pages(&self) -> Vec<&Page> {
            let mut out = Vec::new();
            for page in &self.pages {
                page.walk(&mut out);
            }
            out
        }

        /// Check the identity and back-reference invariants a seed must satisfy.
        pub fn validate(&self) -> Result<(), DomainError> {
            let mut page_ids = BTreeSet::new();
            let mut block_ids = BTreeSet::new();
            check_pages(&self.pages, None, &mut page_ids, &mut block_ids)?;

            let mut task_ids = BTreeSet::new();
            for task in &self.tasks {
                if !task_ids.insert(&task.id) {
                    return Err(DomainError::DuplicateTaskId(task.id.clone()));
                }
            }

            let mut goal_ids = BTreeSet::new();
            for goal in &self.goals {
                if !goal_ids.insert(&goal.id) {
                    return Err(DomainError::DuplicateGoalId(goal.id.clone()));
                }
                if goal.progress > 100 {
                    return Err(DomainError::InvalidProgress(goal.progress));
                }
            }
            Ok(())
        }
    }

    fn check_pages<'a>(
        pages: &'a [Page],
        owner: Option<&PageId>,
        page_ids: &mut BTreeSet<&'a PageId>,
        block_ids: &mut BTreeSet<&'a BlockId>,
    ) -> Result<(), DomainError> {
        for page in pages {
            if !page_ids.insert(&page.id) {
                return Err(DomainError::DuplicatePageId(page.id.clone()));
            }
            if page.parent_id.as_ref() != owner {
                return Err(DomainError::ParentMismatch {
                    child: page.id.clone(),
                    named: page.parent_id.clone(),
                    owner: owner.cloned(),
                });
            }
            check_blocks(&page.blocks, block_ids)?;
            check_pages(&page.children, Some(&page.id), page_ids, block_ids)?;
        }
        Ok(())
    }

    fn check_blocks<'a>(
        blocks: &'a [Block],
        block_ids: &mut BTreeSet<&'a BlockId>,
    ) -> Result<(), DomainError> {
        for block in blocks {
            if !block_ids.insert(&block.id) {
                return Err(DomainError::DuplicateBlockId(block.id.clone()));
            }
            check_blocks(&block.children, block_ids)?;
        }
        Ok(())
    }

    /* ------------------------------- Patches ------------------------------- */

    /// Partial page update. `None` leaves a field alone; the nested option on clearable
    /// fields distinguishes "clear" (`Some(None)`) from "keep" (`None`).
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PagePatch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub title: Option<String>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "::serde_with::rust::double_option"
        )]
        pub icon: Option<Option<String>>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "::serde_with::rust::double_option"
        )]
        pub cover_image: Option<Option<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub blocks: Option<Vec<Block>>,
    }

    impl PagePatch {
        pub fn title(title: impl Into<String>) -> Self {
            Self {
                title: Some(title.into()),
                ..Self::default()
            }
        }

        pub fn blocks(blocks: Vec<Block>) -> Self {
            Self {
                blocks: Some(blocks),
                ..Self::default()
            }
        }

        pub fn apply_to(self, page: &mut Page) {
            if let Some(title) = self.title {
                page.title = title;
            }
            if let Some(icon) = self.icon {
                page.icon = icon;
            }
            if let Some(cover) = self.cover_image {
                page.cover_image = cover;
            }
            if let Some(blocks) = self.blocks {
                page.blocks = blocks;
            }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BlockPatch {
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        pub block_type: Option<BlockType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub checked: Option<bool>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "::serde_with::rust::double_option"
        )]
        pub language: Option<Option<String>>,
    }

    impl BlockPatch {
        pub fn content(content: impl Into<String>) -> Self {
            Self {
                content: Some(content.into()),
                ..Self::default()
            }
        }

        pub fn checked(checked: bool) -> Self {
            Self {
                checked: Some(checked),
                ..Self::default()
            }
        }

        pub fn apply_to(self, block: &mut Block) {
            if let Some(block_type) = self.block_type {
                block.block_type = block_type;
            }
            if let Some(content) = self.content {
                block.content = content;
            }
            if let Some(checked) = self.checked {
                block.checked = Some(checked);
            }
            if let Some(language) = self.language {
                block.language = language;
            }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalPatch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub progress: Option<u8>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "::serde_with::rust::double_option"
        )]
        pub due_date: Option<Option<NaiveDate>>,
    }

    impl GoalPatch {
        pub fn progress(progress: u8) -> Self {
            Self {
                progress: Some(progress),
                ..Self::default()
            }
        }

        /// Merge into `goal`; progress saturates at 100.
        pub fn apply_to(self, goal: &mut Goal) {
            if let Some(title) = self.title {
                goal.title = title;
            }
            if let Some(description) = self.description {
                goal.description = description;
            }
            if let Some(progress) = self.progress {
                goal.progress = progress.min(100);
            }
            if let Some(due_date) = self.due_date {
                goal.due_date = due_date;
            }
        }
    }

    /* ---------------------------- Errors (domain) ---------------------------- */

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    pub enum DomainError {
        #[error("duplicate page id {0}")]
        DuplicatePageId(PageId),
        #[error("duplicate block id {0}")]
        DuplicateBlockId(BlockId),
        #[error("duplicate task id {0}")]
        DuplicateTaskId(TaskId),
        #[error("duplicate goal id {0}")]
        DuplicateGoalId(GoalId),
        #[error("page {child} names parent {named:?} but is owned by {owner:?}")]
        ParentMismatch {
            child: PageId,
            named: Option<PageId>,
            owner: Option<PageId>,
        },
        #[error("goal progress {0} is out of bounds (0..=100)")]
        InvalidProgress(u8),
        #[error("unknown block type {0:?}")]
        UnknownBlockType(String),
        #[error("unknown email category {0:?}")]
        UnknownEmailCategory(String),
    }

}

pub mod store {
    //! The document store: the only sanctioned way to read or mutate the workspace.
    //!
    //! Every operation either applies in full or reports `Outcome::NotFound` and leaves the
    //! workspace untouched. A lookup miss is never an error; UI races (a delete and an edit
    //! firing close together) simply become no-ops.

    use crate::core::*;
    use serde::{Deserialize, Serialize};
    use tracing::{debug, warn};

    /// Result flag for a mutation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Outcome {
        Applied,
        NotFound,
    }

    impl Outcome {
        pub fn is_applied(self) -> bool {
            matches!(self, Outcome::Applied)
        }
    }

    /// A store mutation as data, so sessions can be scripted.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
    pub enum Operation {
        UpdatePage {
            page_id: PageId,
            patch: PagePatch,
        },
        AddPage {
            page: Page,
        },
        DeletePage {
            page_id: PageId,
        },
        UpdateBlock {
            page_id: PageId,
            block_id: BlockId,
            patch: BlockPatch,
        },
        AddBlock {
            page_id: PageId,
            block: Block,
            #[serde(default)]
            after_block_id: Option<BlockId>,
        },
        DeleteBlock {
            page_id: PageId,
            block_id: BlockId,
        },
        ToggleTask {
            task_id: TaskId,
        },
        UpdateGoal {
            goal_id: GoalId,
            patch: GoalPatch,
        },
        Focus {
            #[serde(default)]
            page_id: Option<PageId>,
        },
    }

    impl Operation {
        pub fn name(&self) -> &'static str {
            match self {
                Operation::UpdatePage { .. } => "update_page",
                Operation::AddPage { .. } => "add_page",
                Operation::DeletePage { .. } => "delete_page",
                Operation::UpdateBlock { .. } => "update_block",
                Operation::AddBlock { .. } => "add_block",
                Operation::DeleteBlock { .. } => "delete_block",
                Operation::ToggleTask { .. } => "toggle_task",
                Operation::UpdateGoal { .. } => "update_goal",
                Operation::Focus { .. } => "focus",
            }
        }
    }

    /// Owns the workspace and the focused-page pointer for one session.
    ///
    /// The focused page is kept as an id and resolved against the forest on every read,
    /// so the focused view can never drift from the forest copy.
    #[derive(Debug, Clone)]
    pub struct DocumentStore {
        workspace: Workspace,
        current: Option<PageId>,
    }

    impl DocumentStore {
        /// Validates the seed and focuses its first top-level page.
        pub fn new(workspace: Workspace) -> Result<Self, DomainError> {
            workspace.validate()?;
            let current = workspace.pages.first().map(|p| p.id.clone());
            debug!(
                pages = workspace.pages.len(),
                tasks = workspace.tasks.len(),
                goals = workspace.goals.len(),
                "document store ready"
            );
            Ok(Self { workspace, current })
        }

        pub fn workspace(&self) -> &Workspace {
            &self.workspace
        }

        pub fn into_workspace(self) -> Workspace {
            self.workspace
        }

        /* ------------------------------ Reads ------------------------------ */

        /// First page in document order whose id matches.
        pub fn find_page(&self, page_id: &PageId) -> Option<&Page> {
            find_page_in(&self.workspace.pages, page_id)
        }

        /// Block anywhere in the page's block tree.
        pub fn find_block(&self, page_id: &PageId, block_id: &BlockId) -> Option<&Block> {
            self.find_page(page_id)
                .and_then(|page| find_block_in(&page.blocks, block_id))
        }

        pub fn current_page(&self) -> Option<&Page> {
            self.current.as_ref().and_then(|id| self.find_page(id))
        }

        pub fn current_page_id(&self) -> Option<&PageId> {
            self.current.as_ref()
        }

        /// Focus a page, or clear focus with `None`.
        pub fn set_current_page(&mut self, page_id: Option<PageId>) -> Outcome {
            match page_id {
                None => {
                    self.current = None;
                    Outcome::Applied
                }
                Some(id) if self.find_page(&id).is_some() => {
                    self.current = Some(id);
                    Outcome::Applied
                }
                Some(id) => {
                    debug!(page_id = %id, "set_current_page: no such page");
                    Outcome::NotFound
                }
            }
        }

        /* ----------------------------- Pages ----------------------------- */

        pub fn update_page(&mut self, page_id: &PageId, patch: PagePatch) -> Outcome {
            let Some(page) = find_page_mut(&mut self.workspace.pages, page_id) else {
                debug!(%page_id, "update_page: no such page");
                return Outcome::NotFound;
            };
            patch.apply_to(page);
            page.touch();
            debug!(%page_id, "page updated");
            Outcome::Applied
        }

        /// Append to the top level of the forest. Ids are the caller's responsibility.
        /// The page becomes a root and every sub-page's `parent_id` is pointed at its owner.
        pub fn add_page(&mut self, mut page: Page) -> Outcome {
            if self.find_page(&page.id).is_some() {
                warn!(page_id = %page.id, "add_page: id already present in the forest");
            }
            page.parent_id = None;
            rewire_parents(&mut page);
            debug!(page_id = %page.id, "page added");
            self.workspace.pages.push(page);
            Outcome::Applied
        }

        /// Remove a page and its whole subtree, wherever it sits in the forest.
        pub fn delete_page(&mut self, page_id: &PageId) -> Outcome {
            if !prune_pages(&mut self.workspace.pages, page_id) {
                debug!(%page_id, "delete_page: no such page");
                return Outcome::NotFound;
            }
            let focus_lost = self
                .current
                .as_ref()
                .is_some_and(|id| self.find_page(id).is_none());
            if focus_lost {
                self.current = self.workspace.pages.first().map(|p| p.id.clone());
                debug!(current = ?self.current, "focus moved after delete");
            }
            debug!(%page_id, "page deleted");
            Outcome::Applied
        }

        /* ----------------------------- Blocks ----------------------------- */

        /// Merge `patch` into a block at any depth of the page's block tree.
        pub fn update_block(
            &mut self,
            page_id: &PageId,
            block_id: &BlockId,
            patch: BlockPatch,
        ) -> Outcome {
            let Some(page) = find_page_mut(&mut self.workspace.pages, page_id) else {
                debug!(%page_id, %block_id, "update_block: no such page");
                return Outcome::NotFound;
            };
            let Some(block) = find_block_mut(&mut page.blocks, block_id) else {
                debug!(%page_id, %block_id, "update_block: no such block");
                return Outcome::NotFound;
            };
            patch.apply_to(block);
            page.touch();
            Outcome::Applied
        }

        /// Insert into the page's top-level blocks right after `after`, or at the end when
        /// `after` is absent or unknown.
        pub fn add_block(
            &mut self,
            page_id: &PageId,
            block: Block,
            after: Option<&BlockId>,
        ) -> Outcome {
            let Some(page) = find_page_mut(&mut self.workspace.pages, page_id) else {
                debug!(%page_id, "add_block: no such page");
                return Outcome::NotFound;
            };
            let index = after
                .and_then(|after| page.blocks.iter().position(|b| &b.id == after))
                .map_or(page.blocks.len(), |pos| pos + 1);
            debug!(%page_id, block_id = %block.id, index, "block added");
            page.blocks.insert(index, block);
            page.touch();
            Outcome::Applied
        }

        /// Remove from the page's top-level blocks only; nested toggle content is not reached.
        pub fn delete_block(&mut self, page_id: &PageId, block_id: &BlockId) -> Outcome {
            let Some(page) = find_page_mut(&mut self.workspace.pages, page_id) else {
                debug!(%page_id, %block_id, "delete_block: no such page");
                return Outcome::NotFound;
            };
            let Some(pos) = page.blocks.iter().position(|b| &b.id == block_id) else {
                debug!(%page_id, %block_id, "delete_block: no such top-level block");
                return Outcome::NotFound;
            };
            page.blocks.remove(pos);
            page.touch();
            Outcome::Applied
        }

        /* ------------------------- Tasks and goals ------------------------- */

        /// Flip `completed`. Goal progress is never adjusted.
        pub fn toggle_task(&mut self, task_id: &TaskId) -> Outcome {
            let Some(task) = self.workspace.tasks.iter_mut().find(|t| &t.id == task_id) else {
                debug!(%task_id, "toggle_task: no such task");
                return Outcome::NotFound;
            };
            task.completed = !task.completed;
            debug!(%task_id, completed = task.completed, "task toggled");
            Outcome::Applied
        }

        pub fn update_goal(&mut self, goal_id: &GoalId, patch: GoalPatch) -> Outcome {
            let Some(goal) = self.workspace.goals.iter_mut().find(|g| &g.id == goal_id) else {
                debug!(%goal_id, "update_goal: no such goal");
                return Outcome::NotFound;
            };
            patch.apply_to(goal);
            Outcome::Applied
        }

        /* ----------------------------- Dispatch ----------------------------- */

        pub fn apply(&mut self, op: Operation) -> Outcome {
            match op {
                Operation::UpdatePage { page_id, patch } => self.update_page(&page_id, patch),
                Operation::AddPage { page } => self.add_page(page),
                Operation::DeletePage { page_id } => self.delete_page(&page_id),
                Operation::UpdateBlock {
                    page_id,
                    block_id,
                    patch,
                } => self.update_block(&page_id, &block_id, patch),
                Operation::AddBlock {
                    page_id,
                    block,
                    after_block_id,
                } => self.add_block(&page_id, block, after_block_id.as_ref()),
                Operation::DeleteBlock { page_id, block_id } => {
                    self.delete_block(&page_id, &block_id)
                }
                Operation::ToggleTask { task_id } => self.toggle_task(&task_id),
                Operation::UpdateGoal { goal_id, patch } => self.update_goal(&goal_id, patch),
                Operation::Focus { page_id } => self.set_current_page(page_id),
            }
        }
    }

    /* --------------------------- Tree helpers --------------------------- */

    fn find_page_in<'a>(pages: &'a [Page], page_id: &PageId) -> Option<&'a Page> {
        for page in pages {
            if &page.id == page_id {
                return Some(page);
            }
            if let Some(hit) = find_page_in(&page.children, page_id) {
                return Some(hit);
            }
        }
        None
    }

    fn find_page_mut<'a>(pages: &'a mut [Page], page_id: &PageId) -> Option<&'a mut Page> {
        for page in pages.iter_mut() {
            if &page.id == page_id {
                return Some(page);
            }
            if let Some(hit) = find_page_mut(&mut page.children, page_id) {
                return Some(hit);
            }
        }
        None
    }

    fn find_block_in<'a>(blocks: &'a [Block], block_id: &BlockId) -> Option<&'a Block> {
        for block in blocks {
            if &block.id == block_id {
                return Some(block);
            }
            if let Some(hit) = find_block_in(&block.children, block_id) {
                return Some(hit);
            }
        }
        None
    }

    fn find_block_mut<'a>(blocks: &'a mut [Block], block_id: &BlockId) -> Option<&'a mut Block> {
        for block in blocks.iter_mut() {
            if &block.id == block_id {
                return Some(block);
            }
            if let Some(hit) = find_block_mut(&mut block.children, block_id) {
                return Some(hit);
            }
        }
        None
    }

    fn rewire_parents(page: &mut Page) {
        for child in page.children.iter_mut() {
            child.parent_id = Some(page.id.clone());
            rewire_parents(child);
        }
    }

    /// Filter `page_id` out of this level and every level below it.
    fn prune_pages(pages: &mut Vec<Page>, page_id: &PageId) -> bool {
        let before = pages.len();
        pages.retain(|p| &p.id != page_id);
        let mut removed = pages.len() != before;
        for page in pages.iter_mut() {
            removed |= prune_pages(&mut page.children, page_id);
        }
        removed
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::{TimeZone, Utc};

        fn stamp(day: u32) -> chrono::DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
        }

        fn text(id: &str) -> Block {
            Block::new(BlockId::from(id), BlockType::Text, id)
        }

        /// P1 [A, B, C], P2 (child P2a with a toggle holding T1).
        fn store() -> DocumentStore {
            let p1 = Page::new("P1".into(), "First")
                .with_blocks(vec![text("A"), text("B"), text("C")])
                .with_timestamps(stamp(1), stamp(2));
            let p2a = Page::new("P2a".into(), "Nested")
                .with_blocks(vec![
                    Block::new("T".into(), BlockType::Toggle, "Ideas")
                        .with_children(vec![text("T1")]),
                ])
                .with_timestamps(stamp(3), stamp(3));
            let p2 = Page::new("P2".into(), "Second")
                .with_timestamps(stamp(1), stamp(4))
                .with_child(p2a);
            let mut done = Task::new("t-done".into(), "Done", Priority::High);
            done.completed = true;
            let workspace = Workspace {
                pages: vec![p1, p2],
                tasks: vec![Task::new("t-open".into(), "Open", Priority::High), done],
                goals: vec![Goal {
                    id: "g1".into(),
                    title: "Goal".into(),
                    description: String::new(),
                    progress: 40,
                    tasks: vec![],
                    due_date: None,
                }],
            };
            DocumentStore::new(workspace).expect("valid fixture")
        }

        fn block_ids(store: &DocumentStore, page: &str) -> Vec<String> {
            store
                .find_page(&page.into())
                .expect("page")
                .blocks
                .iter()
                .map(|b| b.id.0.clone())
                .collect()
        }

        #[test]
        fn new_store_focuses_first_top_level_page() {
            let s = store();
            assert_eq!(s.current_page().map(|p| p.id.as_str()), Some("P1"));
        }

        #[test]
        fn find_page_descends_into_children() {
            let s = store();
            assert_eq!(s.find_page(&"P2a".into()).map(|p| p.title.as_str()), Some("Nested"));
            assert!(s.find_page(&"nope".into()).is_none());
        }

        #[test]
        fn update_page_merges_and_refreshes_updated_at() {
            let mut s = store();
            let before = s.find_page(&"P2a".into()).unwrap().clone();

            assert_eq!(s.update_page(&"P2a".into(), PagePatch::title("X")), Outcome::Applied);

            let after = s.find_page(&"P2a".into()).unwrap();
            assert_eq!(after.title, "X");
            assert!(after.updated_at > before.updated_at);
            let mut expected = before.clone();
            expected.title = "X".into();
            expected.updated_at = after.updated_at;
            assert_eq!(after, &expected);
        }

        #[test]
        fn focused_page_follows_updates() {
            let mut s = store();
            s.update_page(&"P1".into(), PagePatch::title("Renamed"));
            assert_eq!(s.current_page().unwrap().title, "Renamed");
        }

        #[test]
        fn lookup_misses_leave_workspace_untouched() {
            let mut s = store();
            let snapshot = s.workspace().clone();
            let missing_page = PageId::from("missing");
            let missing_block = BlockId::from("missing");

            assert_eq!(s.update_page(&missing_page, PagePatch::title("X")), Outcome::NotFound);
            assert_eq!(
                s.update_block(&"P1".into(), &missing_block, BlockPatch::content("x")),
                Outcome::NotFound
            );
            assert_eq!(
                s.update_block(&missing_page, &"A".into(), BlockPatch::content("x")),
                Outcome::NotFound
            );
            assert_eq!(s.delete_block(&"P1".into(), &missing_block), Outcome::NotFound);
            assert_eq!(s.delete_block(&missing_page, &"A".into()), Outcome::NotFound);
            assert_eq!(s.toggle_task(&"missing".into()), Outcome::NotFound);
            assert_eq!(s.update_goal(&"missing".into(), GoalPatch::progress(5)), Outcome::NotFound);
            assert_eq!(s.delete_page(&missing_page), Outcome::NotFound);
            assert_eq!(s.add_block(&missing_page, text("Z"), None), Outcome::NotFound);
            assert_eq!(s.set_current_page(Some(missing_page)), Outcome::NotFound);

            assert_eq!(s.workspace(), &snapshot);
            assert_eq!(s.current_page_id().map(|id| id.as_str()), Some("P1"));
        }

        #[test]
        fn delete_page_cascades_to_descendants() {
            let mut s = store();
            assert_eq!(s.delete_page(&"P2".into()), Outcome::Applied);

            let top: Vec<_> = s.workspace().pages.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(top, ["P1"]);
            assert!(s.find_page(&"P2a".into()).is_none());
            assert!(s.workspace().all_pages().iter().all(|p| p.id.as_str() != "P2a"));
        }

        #[test]
        fn delete_nested_page_keeps_parent() {
            let mut s = store();
            assert_eq!(s.delete_page(&"P2a".into()), Outcome::Applied);
            let p2 = s.find_page(&"P2".into()).unwrap();
            assert!(p2.children.is_empty());
        }

        #[test]
        fn deleting_focused_page_falls_back_to_first_page() {
            let mut s = store();
            s.set_current_page(Some("P2".into()));
            s.delete_page(&"P2".into());
            assert_eq!(s.current_page_id().map(|id| id.as_str()), Some("P1"));

            s.delete_page(&"P1".into());
            assert!(s.current_page().is_none());
            assert!(s.workspace().pages.is_empty());
        }

        #[test]
        fn deleting_parent_of_focused_page_moves_focus() {
            let mut s = store();
            s.set_current_page(Some("P2a".into()));
            s.delete_page(&"P2".into());
            assert_eq!(s.current_page_id().map(|id| id.as_str()), Some("P1"));
        }

        #[test]
        fn add_block_inserts_after_anchor_or_appends() {
            let mut s = store();
            s.add_block(&"P1".into(), text("D"), Some(&"B".into()));
            assert_eq!(block_ids(&s, "P1"), ["A", "B", "D", "C"]);

            let mut s = store();
            s.add_block(&"P1".into(), text("D"), None);
            assert_eq!(block_ids(&s, "P1"), ["A", "B", "C", "D"]);

            let mut s = store();
            s.add_block(&"P1".into(), text("D"), Some(&"unknown".into()));
            assert_eq!(block_ids(&s, "P1"), ["A", "B", "C", "D"]);
        }

        #[test]
        fn add_block_reaches_nested_pages() {
            let mut s = store();
            assert_eq!(s.add_block(&"P2a".into(), text("N"), None), Outcome::Applied);
            assert_eq!(block_ids(&s, "P2a"), ["T", "N"]);
        }

        #[test]
        fn update_block_reaches_toggle_children() {
            let mut s = store();
            let before = s.find_page(&"P2a".into()).unwrap().updated_at;
            let outcome = s.update_block(&"P2a".into(), &"T1".into(), BlockPatch::content("edited"));
            assert_eq!(outcome, Outcome::Applied);
            assert_eq!(s.find_block(&"P2a".into(), &"T1".into()).unwrap().content, "edited");
            assert_eq!(s.find_block(&"P2a".into(), &"T".into()).unwrap().content, "Ideas");
            assert!(s.find_page(&"P2a".into()).unwrap().updated_at > before);
        }

        #[test]
        fn delete_block_is_top_level_only() {
            let mut s = store();
            assert_eq!(s.delete_block(&"P2a".into(), &"T1".into()), Outcome::NotFound);
            assert_eq!(s.delete_block(&"P1".into(), &"B".into()), Outcome::Applied);
            assert_eq!(block_ids(&s, "P1"), ["A", "C"]);
        }

        #[test]
        fn toggle_task_is_an_involution_and_leaves_goals_alone() {
            let mut s = store();
            let original = s.workspace().clone();
            s.toggle_task(&"t-open".into());
            assert!(s.workspace().tasks[0].completed);
            assert_eq!(s.workspace().goals, original.goals);
            s.toggle_task(&"t-open".into());
            assert_eq!(s.workspace(), &original);
        }

        #[test]
        fn update_goal_clamps_progress() {
            let mut s = store();
            s.update_goal(&"g1".into(), GoalPatch::progress(250));
            assert_eq!(s.workspace().goals[0].progress, 100);
        }

        #[test]
        fn add_page_appends_to_top_level() {
            let mut s = store();
            s.add_page(Page::new("P3".into(), "Third"));
            let top: Vec<_> = s.workspace().pages.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(top, ["P1", "P2", "P3"]);
        }

        #[test]
        fn add_page_rewires_subtree_back_references() {
            let mut s = store();
            let mut grandchild = Page::new("gc".into(), "Grandchild");
            grandchild.parent_id = Some("somewhere".into());
            let mut child = Page::new("nc".into(), "Child");
            child.children.push(grandchild);
            let mut page = Page::new("np".into(), "New");
            page.parent_id = Some("P1".into());
            page.children.push(child);

            assert_eq!(s.add_page(page), Outcome::Applied);
            assert_eq!(s.workspace().validate(), Ok(()));
            assert_eq!(s.find_page(&"np".into()).unwrap().parent_id, None);
            assert_eq!(
                s.find_page(&"gc".into()).unwrap().parent_id,
                Some(PageId::from("nc"))
            );

            let json = serde_json::to_string(s.workspace()).unwrap();
            let reloaded: Workspace = serde_json::from_str(&json).unwrap();
            assert!(DocumentStore::new(reloaded).is_ok());
        }

        #[test]
        fn add_page_with_duplicate_id_still_appends() {
            let mut s = store();
            assert_eq!(s.add_page(Page::new("P1".into(), "Shadow")), Outcome::Applied);

            let top: Vec<_> = s.workspace().pages.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(top, ["P1", "P2", "P1"]);
            assert_eq!(s.find_page(&"P1".into()).unwrap().title, "First");
            assert_eq!(
                s.workspace().validate(),
                Err(DomainError::DuplicatePageId("P1".into()))
            );
        }

        #[test]
        fn operations_deserialize_from_tagged_json() {
            let ops: Vec<Operation> = serde_json::from_str(
                r#"[
                    {"op": "update_page", "pageId": "P1", "patch": {"title": "Y"}},
                    {"op": "add_block", "pageId": "P1", "block": {"id": "D", "type": "quote", "content": "q"}, "afterBlockId": "A"},
                    {"op": "toggle_task", "taskId": "t-open"},
                    {"op": "focus", "pageId": "P2a"}
                ]"#,
            )
            .unwrap();
            let mut s = store();
            let outcomes: Vec<_> = ops.into_iter().map(|op| s.apply(op)).collect();
            assert!(outcomes.iter().all(|o| o.is_applied()));
            assert_eq!(block_ids(&s, "P1"), ["A", "D", "B", "C"]);
            assert_eq!(s.current_page().unwrap().title, "Nested");
        }
    }
}

pub mod aggregates {
    //! Read-only projections over a workspace snapshot. Nothing here is cached; every
    //! call recomputes from the data it is handed.

    use crate::core::*;
    use crate::inbox::{self, Inbox};
    use chrono::NaiveDateTime;
    use serde::Serialize;

    pub fn active_tasks(workspace: &Workspace) -> Vec<&Task> {
        workspace.tasks.iter().filter(|t| !t.completed).collect()
    }

    pub fn tasks_by_page<'a>(workspace: &'a Workspace, page_id: &PageId) -> Vec<&'a Task> {
        workspace
            .tasks
            .iter()
            .filter(|t| t.page_id.as_ref() == Some(page_id))
            .collect()
    }

    pub fn tasks_by_goal<'a>(workspace: &'a Workspace, goal_id: &GoalId) -> Vec<&'a Task> {
        workspace
            .tasks
            .iter()
            .filter(|t| t.goal_id.as_ref() == Some(goal_id))
            .collect()
    }

    /// High priority and still open.
    pub fn urgent_tasks(workspace: &Workspace) -> Vec<&Task> {
        workspace
            .tasks
            .iter()
            .filter(|t| t.priority == Priority::High && !t.completed)
            .collect()
    }

    /// The goal with its `tasks` list refreshed from the current task collection.
    pub fn goal_snapshot(workspace: &Workspace, goal_id: &GoalId) -> Option<Goal> {
        let goal = workspace.goals.iter().find(|g| &g.id == goal_id)?;
        let mut snapshot = goal.clone();
        snapshot.tasks = tasks_by_goal(workspace, goal_id)
            .into_iter()
            .cloned()
            .collect();
        Some(snapshot)
    }

    /// Sidebar row: one per page, in document order.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct OutlineEntry {
        pub depth: usize,
        pub id: PageId,
        pub icon: String,
        pub title: String,
        pub child_count: usize,
    }

    pub fn page_outline(workspace: &Workspace) -> Vec<OutlineEntry> {
        fn rec(pages: &[Page], depth: usize, out: &mut Vec<OutlineEntry>) {
            for page in pages {
                out.push(OutlineEntry {
                    depth,
                    id: page.id.clone(),
                    icon: page.display_icon().to_string(),
                    title: page.title.clone(),
                    child_count: page.children.len(),
                });
                rec(&page.children, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        rec(&workspace.pages, 0, &mut out);
        out
    }

    /// Top-level pages whose title contains `query`, ignoring case. Empty query keeps all.
    pub fn search_pages<'a>(workspace: &'a Workspace, query: &str) -> Vec<&'a Page> {
        if query.is_empty() {
            return workspace.pages.iter().collect();
        }
        let needle = query.to_lowercase();
        workspace
            .pages
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Everything the dashboard header and cards show, as of `now`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DashboardSummary {
        pub greeting: &'static str,
        pub active_tasks: usize,
        pub urgent_tasks: usize,
        pub completed_tasks: usize,
        pub goals: usize,
        pub pages: usize,
        pub unread_emails: usize,
        pub urgent_emails: usize,
        pub pending_meetings: usize,
        pub todays_events: usize,
    }

    pub fn dashboard_summary(
        workspace: &Workspace,
        mail: &Inbox,
        now: NaiveDateTime,
    ) -> DashboardSummary {
        let active = active_tasks(workspace).len();
        let counts = inbox::inbox_counts(&mail.emails);
        DashboardSummary {
            greeting: inbox::greeting(now),
            active_tasks: active,
            urgent_tasks: urgent_tasks(workspace).len(),
            completed_tasks: workspace.tasks.len() - active,
            goals: workspace.goals.len(),
            pages: workspace.all_pages().len(),
            unread_emails: counts.unread,
            urgent_emails: counts.urgent,
            pending_meetings: inbox::pending_meetings(&mail.meeting_requests).len(),
            todays_events: inbox::events_on(&mail.events, now.date()).len(),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::seed::{sample_inbox, sample_workspace};

        fn ids(tasks: &[&Task]) -> Vec<String> {
            tasks.iter().map(|t| t.id.0.clone()).collect()
        }

        #[test]
        fn task_filters_match_sample_data() {
            let ws = sample_workspace();
            assert_eq!(
                ids(&active_tasks(&ws)),
                ["task-1", "task-2", "task-5", "task-6", "task-8"]
            );
            assert_eq!(ids(&urgent_tasks(&ws)), ["task-1", "task-5"]);
            assert_eq!(ids(&tasks_by_page(&ws, &"page-2-1".into())), ["task-1", "task-2"]);
            assert_eq!(ids(&tasks_by_goal(&ws, &"goal-1".into())), ["task-5", "task-6"]);
        }

        #[test]
        fn goal_snapshot_tracks_current_task_state() {
            let mut ws = sample_workspace();
            ws.tasks.iter_mut().find(|t| t.id.as_str() == "task-5").unwrap().completed = true;
            let goal = goal_snapshot(&ws, &"goal-1".into()).unwrap();
            assert!(goal.tasks.iter().any(|t| t.id.as_str() == "task-5" && t.completed));
            assert_eq!(goal.progress, 65);
            assert!(goal_snapshot(&ws, &"goal-9".into()).is_none());
        }

        #[test]
        fn outline_walks_depth_first() {
            let ws = sample_workspace();
            let outline = page_outline(&ws);
            let rows: Vec<_> = outline.iter().map(|e| (e.depth, e.id.as_str())).collect();
            assert_eq!(
                rows,
                [(0, "page-1"), (0, "page-2"), (1, "page-2-1"), (0, "page-3"), (0, "page-4")]
            );
        }

        #[test]
        fn search_is_case_insensitive_and_top_level_only() {
            let ws = sample_workspace();
            let hits: Vec<_> = search_pages(&ws, "NOTES").iter().map(|p| p.id.as_str()).collect();
            assert_eq!(hits, ["page-2"]);
            assert_eq!(search_pages(&ws, "").len(), 4);
        }

        #[test]
        fn dashboard_counts_whole_forest_and_inbox() {
            let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 23)
                .unwrap()
                .and_hms_opt(9, 15, 0)
                .unwrap();
            let summary = dashboard_summary(&sample_workspace(), &sample_inbox(now), now);
            assert_eq!(
                summary,
                DashboardSummary {
                    greeting: "Good morning",
                    active_tasks: 5,
                    urgent_tasks: 2,
                    completed_tasks: 3,
                    goals: 3,
                    pages: 5,
                    unread_emails: 3,
                    urgent_emails: 2,
                    pending_meetings: 1,
                    todays_events: 3,
                }
            );
        }
    }
}

pub mod shorthand {
    //! Notion-style markdown shortcuts for a single line of input, built on `nom`.
    //!
    //! `# `, `## `, `### ` headings; `[] `/`[ ] ` and `[x] ` todos; `> ` toggles;
    //! `" ` quotes; `---` dividers; ```` ```lang code ```` snippets. Anything else is text.

    use crate::core::{Block, BlockId, BlockType};
    use nom::{
        IResult,
        branch::alt,
        bytes::complete::{tag, take_while, take_while_m_n, take_while1},
        character::complete::{char, space0, space1},
        combinator::{all_consuming, map, map_opt, opt, rest, value},
        sequence::{preceded, tuple},
    };

    /// Block fields recovered from a shorthand line; an id is attached on insertion.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct BlockDraft {
        pub block_type: BlockType,
        pub content: String,
        pub checked: Option<bool>,
        pub language: Option<String>,
    }

    impl BlockDraft {
        fn new(block_type: BlockType, content: &str) -> Self {
            Self {
                block_type,
                content: content.to_string(),
                checked: None,
                language: None,
            }
        }

        pub fn into_block(self, id: BlockId) -> Block {
            let mut block = Block::new(id, self.block_type, self.content);
            if self.checked.is_some() {
                block.checked = self.checked;
            }
            block.language = self.language;
            block
        }
    }

    /// Never fails; unrecognized input becomes a text block.
    pub fn parse_line(line: &str) -> BlockDraft {
        let line = line.trim_end_matches(['\r', '\n']);
        match draft(line) {
            Ok((_, draft)) => draft,
            Err(_) => BlockDraft::new(BlockType::Text, line),
        }
    }

    type PResult<'a, T> = IResult<&'a str, T>;

    fn draft(i: &str) -> PResult<'_, BlockDraft> {
        alt((divider, heading, todo, code, toggle, quote))(i)
    }

    fn divider(i: &str) -> PResult<'_, BlockDraft> {
        map(
            all_consuming(tuple((tag("---"), take_while(|c: char| c == '-'), space0))),
            |_| BlockDraft::new(BlockType::Divider, ""),
        )(i)
    }

    fn heading(i: &str) -> PResult<'_, BlockDraft> {
        map_opt(
            tuple((take_while_m_n(1, 3, |c: char| c == '#'), space1, rest)),
            |(hashes, _, text): (&str, &str, &str)| {
                let block_type = match hashes.len() {
                    1 => BlockType::Heading1,
                    2 => BlockType::Heading2,
                    3 => BlockType::Heading3,
                    _ => return None,
                };
                Some(BlockDraft::new(block_type, text))
            },
        )(i)
    }

    fn todo(i: &str) -> PResult<'_, BlockDraft> {
        let open = value(false, alt((tag("[]"), tag("[ ]"))));
        let done = value(true, alt((tag("[x]"), tag("[X]"))));
        map(
            tuple((alt((open, done)), space1, rest)),
            |(checked, _, text): (bool, &str, &str)| {
                let mut draft = BlockDraft::new(BlockType::Todo, text);
                draft.checked = Some(checked);
                draft
            },
        )(i)
    }

    fn code(i: &str) -> PResult<'_, BlockDraft> {
        let language = take_while1(|c: char| c.is_alphanumeric() || "+-_#".contains(c));
        map(
            tuple((tag("```"), opt(language), space0, rest)),
            |(_, language, _, body): (&str, Option<&str>, &str, &str)| {
                let mut draft = BlockDraft::new(BlockType::Code, body);
                draft.language = language.map(str::to_string);
                draft
            },
        )(i)
    }

    fn toggle(i: &str) -> PResult<'_, BlockDraft> {
        map(preceded(tuple((char('>'), space1)), rest), |text: &str| {
            BlockDraft::new(BlockType::Toggle, text)
        })(i)
    }

    fn quote(i: &str) -> PResult<'_, BlockDraft> {
        map(preceded(tuple((char('"'), space1)), rest), |text: &str| {
            BlockDraft::new(BlockType::Quote, text)
        })(i)
    }

}

pub mod format {
    //! Plain-text rendering of pages, one shorthand line per block.

    use crate::core::*;

    pub fn format_page(page: &Page) -> String {
        let mut out = String::new();
        out.push_str(page.display_icon());
        out.push(' ');
        out.push_str(&page.title);
        out.push_str("\n\n");
        for block in &page.blocks {
            format_block(&mut out, block, 0);
        }
        out
    }

    /// Append `block` and its children, two spaces of indent per nesting level.
    pub fn format_block(out: &mut String, block: &Block, depth: usize) {
        let indent = "  ".repeat(depth);
        let line = block_line(block);
        if line.is_empty() {
            out.push_str(&indent);
            out.push('\n');
        }
        for l in line.lines() {
            out.push_str(&indent);
            out.push_str(l);
            out.push('\n');
        }
        for child in &block.children {
            format_block(out, child, depth + 1);
        }
    }

    fn block_line(block: &Block) -> String {
        let content = block.content.as_str();
        match block.block_type {
            BlockType::Text => content.to_string(),
            BlockType::Heading1 => format!("# {content}"),
            BlockType::Heading2 => format!("## {content}"),
            BlockType::Heading3 => format!("### {content}"),
            BlockType::Todo => {
                let mark = if block.is_checked() { 'x' } else { ' ' };
                format!("[{mark}] {content}")
            }
            BlockType::Toggle => format!("> {content}"),
            BlockType::Code => match (&block.language, content.is_empty()) {
                (Some(lang), true) => format!("```{lang}"),
                (Some(lang), false) => format!("```{lang} {content}"),
                (None, true) => "```".to_string(),
                (None, false) => format!("``` {content}"),
            },
            BlockType::Divider => "---".to_string(),
            BlockType::Quote => format!("\" {content}"),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::shorthand::parse_line;

        #[test]
        fn renders_toggle_children_indented() {
            let page = Page::new("p".into(), "Ideas")
                .with_icon("💡")
                .with_blocks(vec![
                    Block::new("h".into(), BlockType::Heading1, "Idea Bank"),
                    Block::new("t".into(), BlockType::Toggle, "App Ideas").with_children(vec![
                        Block::new("c".into(), BlockType::Text, "Habit tracker"),
                    ]),
                    Block::divider("d".into()),
                ]);
            assert_eq!(
                format_page(&page),
                "💡 Ideas\n\n# Idea Bank\n> App Ideas\n  Habit tracker\n---\n"
            );
        }

        #[test]
        fn single_line_blocks_read_back_through_shorthand() {
            let blocks = [
                Block::todo("a".into(), "Beta testing", true),
                Block::new("b".into(), BlockType::Heading2, "Notes"),
                Block::new("c".into(), BlockType::Code, "let x = 1;").with_language("rust"),
                Block::new("d".into(), BlockType::Quote, "Get started"),
            ];
            for block in blocks {
                let draft = parse_line(&block_line(&block));
                assert_eq!(draft.block_type, block.block_type);
                assert_eq!(draft.content, block.content);
                assert_eq!(draft.language, block.language);
            }
        }

        #[test]
        fn untitled_page_uses_default_icon() {
            let page = Page::new("p".into(), "Untitled");
            assert!(format_page(&page).starts_with(DEFAULT_PAGE_ICON));
        }
    }
}

pub mod editor {
    //! Editor-surface actions. Each is a single store mutation (or a commit followed by
    //! one), matching what the block editor does on blur, Enter, Backspace and quick add.

    use crate::core::*;
    use crate::shorthand::parse_line;
    use crate::store::{DocumentStore, Outcome};

    /// Write the editor's text back, skipping the store when nothing changed.
    pub fn commit_content(
        store: &mut DocumentStore,
        page_id: &PageId,
        block_id: &BlockId,
        text: &str,
    ) -> Outcome {
        match store.find_block(page_id, block_id) {
            None => Outcome::NotFound,
            Some(block) if block.content == text => Outcome::Applied,
            Some(_) => store.update_block(page_id, block_id, BlockPatch::content(text)),
        }
    }

    /// Enter: commit the current block and open an empty text block right after it.
    pub fn split_after(
        store: &mut DocumentStore,
        page_id: &PageId,
        block_id: &BlockId,
        text: &str,
    ) -> Option<BlockId> {
        commit_content(store, page_id, block_id, text);
        let id = BlockId::generate();
        let block = Block::new(id.clone(), BlockType::Text, "");
        store
            .add_block(page_id, block, Some(block_id))
            .is_applied()
            .then_some(id)
    }

    /// Backspace on an empty block removes it, except for the page's `heading1`.
    pub fn backspace_empty(
        store: &mut DocumentStore,
        page_id: &PageId,
        block_id: &BlockId,
        text: &str,
    ) -> bool {
        let removable = store
            .find_block(page_id, block_id)
            .is_some_and(|b| b.block_type != BlockType::Heading1);
        text.is_empty() && removable && store.delete_block(page_id, block_id).is_applied()
    }

    pub fn toggle_check(store: &mut DocumentStore, page_id: &PageId, block_id: &BlockId) -> Outcome {
        let Some(block) = store.find_block(page_id, block_id) else {
            return Outcome::NotFound;
        };
        let checked = !block.is_checked();
        store.update_block(page_id, block_id, BlockPatch::checked(checked))
    }

    /// Append an empty block of `block_type` to the end of the page.
    pub fn quick_add(
        store: &mut DocumentStore,
        page_id: &PageId,
        block_type: BlockType,
    ) -> Option<BlockId> {
        let id = BlockId::generate();
        let block = Block::new(id.clone(), block_type, "");
        store.add_block(page_id, block, None).is_applied().then_some(id)
    }

    /// Sidebar "new page": an `Untitled` page with a title heading and an empty line,
    /// appended to the top level and focused.
    pub fn new_page(store: &mut DocumentStore) -> PageId {
        let id = PageId::generate();
        let page = Page::new(id.clone(), "Untitled")
            .with_icon(DEFAULT_PAGE_ICON)
            .with_blocks(vec![
                Block::new(BlockId::generate(), BlockType::Heading1, "Untitled"),
                Block::new(BlockId::generate(), BlockType::Text, ""),
            ]);
        store.add_page(page);
        store.set_current_page(Some(id.clone()));
        id
    }

    /// Parse `line` as shorthand and insert the block after `after` (or at the end).
    pub fn insert_shorthand(
        store: &mut DocumentStore,
        page_id: &PageId,
        after: Option<&BlockId>,
        line: &str,
    ) -> Option<BlockId> {
        let id = BlockId::generate();
        let block = parse_line(line).into_block(id.clone());
        store.add_block(page_id, block, after).is_applied().then_some(id)
    }

}

pub mod assistant {
    //! Simulated assistant: canned replies for the quick actions, a workspace-aware
    //! fallback for everything else, and a chat panel that delivers replies after a delay.
    //!
    //! A pending reply belongs to the panel. Sending another message, closing the panel or
    //! dropping it aborts the pending reply, so a late reply never lands after the user
    //! has moved on.

    use crate::aggregates;
    use crate::core::string_id;
    use crate::store::DocumentStore;
    use chrono::{DateTime, Utc};
    use indexmap::IndexMap;
    use serde::{Deserialize, Serialize};
    use std::{sync::LazyLock, time::Duration};
    use tokio::task::JoinHandle;
    use tracing::debug;

    string_id!(MessageId, "msg");

    pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1500);

    pub const WELCOME_MESSAGE: &str = "Hi! I'm your AI assistant. I can help you plan your day, break down goals, prioritize tasks, and summarize your notes. What would you like to work on?";

    pub const DAILY_PLAN_PROMPT: &str = "Create a daily plan for today based on my goals and tasks";
    pub const BREAK_DOWN_PROMPT: &str = "Help me break down my current goals into actionable tasks";
    pub const PRIORITIZE_PROMPT: &str = "Help me prioritize my pending tasks";
    pub const SUMMARIZE_PROMPT: &str = "Summarize the key points from my current page";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct QuickAction {
        pub label: &'static str,
        pub prompt: &'static str,
    }

    pub const QUICK_ACTIONS: [QuickAction; 4] = [
        QuickAction {
            label: "Generate daily plan",
            prompt: DAILY_PLAN_PROMPT,
        },
        QuickAction {
            label: "Break down goals",
            prompt: BREAK_DOWN_PROMPT,
        },
        QuickAction {
            label: "Prioritize tasks",
            prompt: PRIORITIZE_PROMPT,
        },
        QuickAction {
            label: "Summarize notes",
            prompt: SUMMARIZE_PROMPT,
        },
    ];

    const DAILY_PLAN_REPLY: &str = r#"Here's your optimized daily plan based on your goals:

**Morning Focus Block (9:00 - 12:00)**
1. 🔴 Review PRs by Wednesday *(High Priority)*
2. 📝 Continue MVP development work
3. 📖 30-minute reading session

**Afternoon Sprint (1:00 - 5:00)**
4. 📋 Update documentation
5. 🧪 Start beta testing preparations

**Evening Wind-down**
6. 🧘 Evening meditation
7. 📓 Journal reflection

*This plan aligns with your Q1 MVP launch goal (65% complete) and reading goal (8% complete).*"#;

    const BREAK_DOWN_REPLY: &str = r#"Let me break down your goals into actionable tasks:

**Goal: Launch MVP by Q1** (65% complete)
- [ ] Complete remaining frontend features
- [ ] Set up CI/CD pipeline
- [ ] Write unit tests for core components
- [ ] Create user onboarding flow
- [ ] Prepare beta launch checklist

**Goal: Read 24 Books This Year** (8% complete)
- [ ] Finish current book this week
- [ ] Create reading list for next month
- [ ] Schedule 30-min daily reading blocks
- [ ] Join a book club for accountability

**Goal: Build Consistent Habits** (40% complete)
- [ ] Define morning routine checklist
- [ ] Set up habit tracking in this workspace
- [ ] Create evening review ritual
- [ ] Identify habit triggers and rewards"#;

    const PRIORITIZE_REPLY: &str = r#"Based on urgency and importance, here's your prioritized task list:

**🔴 High Priority (Do First)**
1. Review PRs by Wednesday - *Deadline approaching*
2. MVP development - *Critical for Q1 goal*

**🟡 Medium Priority (Schedule)**
3. Update documentation - *Important but flexible*
4. Beta testing preparations - *Depends on MVP*

**🟢 Lower Priority (When Possible)**
5. Read for 30 minutes - *Personal goal, flexible timing*

**Pro Tips:**
- Block 2 hours tomorrow morning for PR reviews
- Pair documentation with testing prep
- Use reading as an end-of-day reward"#;

    const SUMMARIZE_REPLY: &str = r#"Here's a summary of your current page:

**Getting Started - Key Points**

📌 **Main Purpose:** Personal productivity hub for organizing thoughts, tracking tasks, and achieving goals.

📌 **Quick Tips Covered:**
- Use / command for block types
- AI assistant available for smart suggestions
- Nested pages help organization

📌 **Notable Quote:**
> "The secret of getting ahead is getting started." — Mark Twain

**Suggested Actions:**
1. Complete the remaining onboarding todos
2. Explore the AI assistant features
3. Create your first nested page structure"#;

    static CANNED_REPLIES: LazyLock<IndexMap<&'static str, &'static str>> = LazyLock::new(|| {
        IndexMap::from([
            (DAILY_PLAN_PROMPT, DAILY_PLAN_REPLY),
            (BREAK_DOWN_PROMPT, BREAK_DOWN_REPLY),
            (PRIORITIZE_PROMPT, PRIORITIZE_REPLY),
            (SUMMARIZE_PROMPT, SUMMARIZE_REPLY),
        ])
    });

    /// Reply for `input` against the current store. Exact (trimmed) prompt matches get the
    /// canned text; anything else gets a fallback quoting live workspace counts.
    pub fn respond(input: &str, store: &DocumentStore) -> String {
        let prompt = input.trim();
        if let Some(reply) = CANNED_REPLIES.get(prompt) {
            return (*reply).to_string();
        }
        let workspace = store.workspace();
        let pending = aggregates::active_tasks(workspace).len();
        let goals = workspace.goals.len();
        let title = store
            .current_page()
            .map(|p| p.title.as_str())
            .unwrap_or("Unknown");
        format!(
            "I understand you want to: \"{prompt}\"\n\n\
             Based on your workspace, here are some thoughts:\n\n\
             • You have {pending} pending tasks\n\
             • {goals} active goals to track\n\
             • Your current page is \"{title}\"\n\n\
             Would you like me to help you with any of these specifically?"
        )
    }

    /* ------------------------------- Chat ------------------------------- */

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Assistant,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub id: MessageId,
        pub role: Role,
        pub content: String,
        pub timestamp: DateTime<Utc>,
    }

    impl ChatMessage {
        pub fn new(role: Role, content: impl Into<String>) -> Self {
            Self {
                id: MessageId::generate(),
                role,
                content: content.into(),
                timestamp: Utc::now(),
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
    pub enum ChatError {
        #[error("message is empty")]
        EmptyMessage,
        #[error("assistant panel is closed")]
        PanelClosed,
    }

    /// Chat history plus at most one in-flight reply.
    #[derive(Debug)]
    pub struct ChatPanel {
        messages: Vec<ChatMessage>,
        pending: Option<JoinHandle<ChatMessage>>,
        delay: Duration,
        open: bool,
    }

    impl ChatPanel {
        pub fn new(delay: Duration) -> Self {
            Self {
                messages: vec![ChatMessage::new(Role::Assistant, WELCOME_MESSAGE)],
                pending: None,
                delay,
                open: true,
            }
        }

        pub fn messages(&self) -> &[ChatMessage] {
            &self.messages
        }

        pub fn is_open(&self) -> bool {
            self.open
        }

        pub fn is_loading(&self) -> bool {
            self.pending.is_some()
        }

        /// Quick actions are offered until the conversation gets going.
        pub fn show_quick_actions(&self) -> bool {
            self.messages.len() <= 2
        }

        pub fn open(&mut self) {
            self.open = true;
        }

        pub fn close(&mut self) {
            self.open = false;
            self.cancel_pending();
        }

        /// Record the user's message and schedule the reply. The reply text is computed
        /// now, from the store as it is at send time. Must run inside a tokio runtime.
        pub fn send(&mut self, input: &str, store: &DocumentStore) -> Result<(), ChatError> {
            if !self.open {
                return Err(ChatError::PanelClosed);
            }
            let content = input.trim();
            if content.is_empty() {
                return Err(ChatError::EmptyMessage);
            }
            self.cancel_pending();

            let reply = respond(content, store);
            let delay = self.delay;
            self.pending = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                ChatMessage::new(Role::Assistant, reply)
            }));
            self.messages.push(ChatMessage::new(Role::User, content));
            debug!(delay_ms = delay.as_millis() as u64, "assistant reply scheduled");
            Ok(())
        }

        /// Wait for the pending reply and append it. `None` when nothing is pending or the
        /// reply was aborted. Safe to cancel: the reply stays pending if this is dropped.
        pub async fn next_reply(&mut self) -> Option<&ChatMessage> {
            let handle = self.pending.as_mut()?;
            let result = handle.await;
            self.pending = None;
            match result {
                Ok(message) => {
                    self.messages.push(message);
                    self.messages.last()
                }
                Err(err) => {
                    debug!(error = %err, "assistant reply did not complete");
                    None
                }
            }
        }

        fn cancel_pending(&mut self) {
            if let Some(handle) = self.pending.take() {
                handle.abort();
                debug!("pending assistant reply cancelled");
            }
        }
    }

    impl Default for ChatPanel {
        fn default() -> Self {
            Self::new(DEFAULT_REPLY_DELAY)
        }
    }

    impl Drop for ChatPanel {
        fn drop(&mut self) {
            self.cancel_pending();
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::core::TaskId;
        use crate::seed::sample_workspace;
        use tokio::time::{Instant, timeout};

        fn store() -> DocumentStore {
            DocumentStore::new(sample_workspace()).expect("sample is valid")
        }

        #[test]
        fn canned_prompt_returns_fixed_text() {
            let reply = respond("Summarize the key points from my current page", &store());
            assert_eq!(reply, SUMMARIZE_REPLY);
            assert_eq!(respond(&format!("  {PRIORITIZE_PROMPT} "), &store()), PRIORITIZE_REPLY);
        }

        #[test]
        fn fallback_quotes_live_counts() {
            let mut s = store();
            let reply = respond("What next?", &s);
            assert!(reply.contains("You have 5 pending tasks"));
            assert!(reply.contains("3 active goals"));
            assert!(reply.contains("Your current page is \"Getting Started\""));

            s.toggle_task(&TaskId::from("task-1"));
            s.set_current_page(None);
            let reply = respond("What next?", &s);
            assert!(reply.contains("You have 4 pending tasks"));
            assert!(reply.contains("\"Unknown\""));
        }

        #[test]
        fn quick_actions_all_have_canned_replies() {
            for action in QUICK_ACTIONS {
                assert!(CANNED_REPLIES.contains_key(action.prompt), "{}", action.label);
            }
        }

        #[tokio::test(start_paused = true)]
        async fn reply_arrives_after_delay() {
            let s = store();
            let mut panel = ChatPanel::default();
            let start = Instant::now();
            panel.send(DAILY_PLAN_PROMPT, &s).unwrap();
            assert!(panel.is_loading());

            assert!(timeout(Duration::from_millis(1000), panel.next_reply()).await.is_err());
            assert!(panel.is_loading());

            let reply = panel.next_reply().await.expect("reply").clone();
            assert!(start.elapsed() >= DEFAULT_REPLY_DELAY);
            assert_eq!(reply.role, Role::Assistant);
            assert_eq!(reply.content, DAILY_PLAN_REPLY);
            assert!(!panel.is_loading());
            assert_eq!(panel.messages().len(), 3);
            assert!(!panel.show_quick_actions());
        }

        #[tokio::test(start_paused = true)]
        async fn closing_the_panel_drops_the_pending_reply() {
            let s = store();
            let mut panel = ChatPanel::default();
            panel.send("hello", &s).unwrap();
            panel.close();
            assert!(!panel.is_loading());

            tokio::time::sleep(Duration::from_secs(5)).await;
            assert!(panel.next_reply().await.is_none());
            assert_eq!(panel.messages().len(), 2);
            assert_eq!(panel.send("again", &s), Err(ChatError::PanelClosed));
        }

        #[tokio::test(start_paused = true)]
        async fn a_new_message_supersedes_the_pending_reply() {
            let s = store();
            let mut panel = ChatPanel::default();
            panel.send("first", &s).unwrap();
            panel.send(PRIORITIZE_PROMPT, &s).unwrap();

            let reply = panel.next_reply().await.expect("reply").content.clone();
            assert_eq!(reply, PRIORITIZE_REPLY);
            let roles: Vec<_> = panel.messages().iter().map(|m| m.role).collect();
            assert_eq!(
                roles,
                [Role::Assistant, Role::User, Role::User, Role::Assistant]
            );
        }

        #[tokio::test]
        async fn blank_input_is_rejected() {
            let mut panel = ChatPanel::default();
            assert_eq!(panel.send("   ", &store()), Err(ChatError::EmptyMessage));
            assert!(!panel.is_loading());
            assert!(panel.show_quick_actions());
        }
    }
}

pub mod inbox {
    //! Mail, calendar and meeting-request sample sets with the read models built on them:
    //! inbox filtering and badges, a day view over events, and the meeting scheduler's slot
    //! picking and reply draft. Nothing here touches the document store.

    use crate::core::{DomainError, Priority, string_id};
    use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
    use serde::{Deserialize, Serialize};
    use serde_with::skip_serializing_none;
    use std::{fmt, str::FromStr};

    string_id!(EmailId, "email");
    string_id!(EventId, "event");
    string_id!(MeetingRequestId, "meeting-req");

    /* ------------------------------- Mail ------------------------------- */

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum EmailCategory {
        Meeting,
        Task,
        Deadline,
        FollowUp,
        LowPriority,
        Unclassified,
    }

    impl EmailCategory {
        pub const ALL: [EmailCategory; 6] = [
            EmailCategory::Meeting,
            EmailCategory::Task,
            EmailCategory::Deadline,
            EmailCategory::FollowUp,
            EmailCategory::LowPriority,
            EmailCategory::Unclassified,
        ];

        pub fn as_str(self) -> &'static str {
            match self {
                EmailCategory::Meeting => "meeting",
                EmailCategory::Task => "task",
                EmailCategory::Deadline => "deadline",
                EmailCategory::FollowUp => "follow-up",
                EmailCategory::LowPriority => "low-priority",
                EmailCategory::Unclassified => "unclassified",
            }
        }
    }

    impl fmt::Display for EmailCategory {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for EmailCategory {
        type Err = DomainError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            EmailCategory::ALL
                .into_iter()
                .find(|c| c.as_str().eq_ignore_ascii_case(s))
                .ok_or_else(|| DomainError::UnknownEmailCategory(s.to_string()))
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Contact {
        pub name: String,
        pub email: String,
    }

    /// What the classifier pulled out of a message.
    #[skip_serializing_none]
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExtractedData {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub dates: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub people: Vec<String>,
        pub intent: Option<String>,
        pub priority: Option<Priority>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum ActionKind {
        Reply,
        CreateTask,
        ScheduleMeeting,
        AddToCalendar,
        FollowUp,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SuggestedAction {
        pub id: String,
        #[serde(rename = "type")]
        pub kind: ActionKind,
        pub label: String,
        pub description: String,
    }

    #[skip_serializing_none]
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Email {
        pub id: EmailId,
        pub thread_id: String,
        pub from: Contact,
        pub to: Vec<String>,
        pub subject: String,
        /// One-line preview shown in the list.
        pub snippet: String,
        pub body: String,
        /// Local wall-clock time.
        pub received_at: NaiveDateTime,
        #[serde(default)]
        pub is_read: bool,
        #[serde(default)]
        pub is_starred: bool,
        #[serde(default)]
        pub labels: Vec<String>,
        pub category: EmailCategory,
        pub extracted_data: Option<ExtractedData>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub suggested_actions: Vec<SuggestedAction>,
    }

    impl Email {
        pub fn priority(&self) -> Option<Priority> {
            self.extracted_data.as_ref().and_then(|d| d.priority)
        }

        /// Classified as high priority.
        pub fn is_urgent(&self) -> bool {
            self.priority() == Some(Priority::High)
        }
    }

    /* ----------------------------- Calendar ----------------------------- */

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum EventStatus {
        Confirmed,
        Tentative,
        Cancelled,
    }

    #[skip_serializing_none]
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CalendarEvent {
        pub id: EventId,
        pub title: String,
        pub description: Option<String>,
        pub start: NaiveDateTime,
        pub end: NaiveDateTime,
        #[serde(default)]
        pub attendees: Vec<String>,
        pub location: Option<String>,
        pub meeting_link: Option<String>,
        /// Message the event was scheduled from.
        pub email_id: Option<EmailId>,
        pub status: EventStatus,
    }

    /// Candidate meeting time. `score` is a 0..=100 preference match.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TimeSlot {
        pub start: NaiveDateTime,
        pub end: NaiveDateTime,
        pub score: u8,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum MeetingStatus {
        Pending,
        Scheduled,
        Declined,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MeetingRequest {
        pub id: MeetingRequestId,
        pub email_id: EmailId,
        /// Sender address.
        pub from: String,
        pub subject: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub proposed_times: Vec<NaiveDateTime>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub suggested_slots: Vec<TimeSlot>,
        pub status: MeetingStatus,
        /// Minutes.
        #[serde(rename = "duration")]
        pub duration_minutes: u32,
    }

    /// The three sample sets the session starts with.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Inbox {
        #[serde(default)]
        pub emails: Vec<Email>,
        #[serde(default)]
        pub events: Vec<CalendarEvent>,
        #[serde(default)]
        pub meeting_requests: Vec<MeetingRequest>,
    }

    impl Inbox {
        pub fn find_email(&self, id: &EmailId) -> Option<&Email> {
            self.emails.iter().find(|e| &e.id == id)
        }

        pub fn find_meeting_request(&self, id: &MeetingRequestId) -> Option<&MeetingRequest> {
            self.meeting_requests.iter().find(|m| &m.id == id)
        }
    }

    /* ---------------------------- Read models ---------------------------- */

    /// `None` keeps every message.
    pub fn filter_emails(emails: &[Email], category: Option<EmailCategory>) -> Vec<&Email> {
        emails
            .iter()
            .filter(|e| category.is_none_or(|c| e.category == c))
            .collect()
    }

    /// Badges over the whole inbox, independent of the active filter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub struct InboxCounts {
        pub unread: usize,
        pub meetings: usize,
        pub urgent: usize,
    }

    pub fn inbox_counts(emails: &[Email]) -> InboxCounts {
        InboxCounts {
            unread: emails.iter().filter(|e| !e.is_read).count(),
            meetings: emails
                .iter()
                .filter(|e| e.category == EmailCategory::Meeting)
                .count(),
            urgent: emails.iter().filter(|e| e.is_urgent()).count(),
        }
    }

    pub fn pending_meetings(requests: &[MeetingRequest]) -> Vec<&MeetingRequest> {
        requests
            .iter()
            .filter(|m| m.status == MeetingStatus::Pending)
            .collect()
    }

    /// Events starting on `day`, earliest first.
    pub fn events_on(events: &[CalendarEvent], day: NaiveDate) -> Vec<&CalendarEvent> {
        let mut hits: Vec<_> = events.iter().filter(|e| e.start.date() == day).collect();
        hits.sort_by_key(|e| e.start);
        hits
    }

    /// Day-view navigation: `days` forward (or back when negative).
    pub fn shift_day(day: NaiveDate, days: i64) -> NaiveDate {
        day + Duration::days(days)
    }

    pub fn greeting(now: NaiveDateTime) -> &'static str {
        match now.hour() {
            0..=11 => "Good morning",
            12..=16 => "Good afternoon",
            _ => "Good evening",
        }
    }

    /* ------------------------- Meeting scheduling ------------------------- */

    pub const MAX_SELECTED_SLOTS: usize = 3;

    /// Slots offered for `request`: its own suggestions, or the next three days at the
    /// current time of day when it has none.
    pub fn suggested_slots(request: Option<&MeetingRequest>, now: NaiveDateTime) -> Vec<TimeSlot> {
        if let Some(request) = request.filter(|r| !r.suggested_slots.is_empty()) {
            return request.suggested_slots.clone();
        }
        let minutes = request.map_or(30, |r| i64::from(r.duration_minutes));
        [(1, 95), (2, 88), (3, 75)]
            .into_iter()
            .map(|(days, score)| {
                let start = now + Duration::days(days);
                TimeSlot {
                    start,
                    end: start + Duration::minutes(minutes),
                    score,
                }
            })
            .collect()
    }

    /// Slots picked for the reply, keyed by start time, at most `MAX_SELECTED_SLOTS`.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct SlotSelection {
        slots: Vec<TimeSlot>,
    }

    impl SlotSelection {
        pub fn slots(&self) -> &[TimeSlot] {
            &self.slots
        }

        /// Deselect a picked slot or pick a new one. Once full, new picks are ignored.
        /// Returns whether `slot` is selected afterwards.
        pub fn toggle(&mut self, slot: TimeSlot) -> bool {
            if let Some(pos) = self.slots.iter().position(|s| s.start == slot.start) {
                self.slots.remove(pos);
                return false;
            }
            if self.slots.len() >= MAX_SELECTED_SLOTS {
                return false;
            }
            self.slots.push(slot);
            true
        }
    }

    /// Name to greet in a reply: the linked message's sender, or "there".
    pub fn sender_name<'a>(inbox: &'a Inbox, request: &MeetingRequest) -> &'a str {
        inbox
            .find_email(&request.email_id)
            .map_or("there", |e| e.from.name.as_str())
    }

    pub fn format_slot(slot: &TimeSlot) -> String {
        slot.start.format("%a, %b %-d, %-I:%M %p").to_string()
    }

    /// Reply proposing the picked slots, addressed by first name. Empty with no slots.
    pub fn reply_draft(slots: &[TimeSlot], sender_name: &str) -> String {
        if slots.is_empty() {
            return String::new();
        }
        let first_name = sender_name.split(' ').next().unwrap_or(sender_name);
        let times = slots.iter().map(format_slot).collect::<Vec<_>>().join("\n• ");
        format!(
            "Hi {first_name},\n\n\
             Thanks for reaching out! I'd be happy to meet.\n\n\
             Here are some times that work for me:\n\
             • {times}\n\n\
             Let me know which works best for you, and I'll send over a calendar invite.\n\n\
             Best regards"
        )
    }

}

pub mod storage {
    //! Seed providers. The store never reads files itself; a `WorkspaceSource` hands it a
    //! complete workspace value at session start.

    use crate::core::Workspace;
    use crate::store::DocumentStore;
    use anyhow::{Context, Result};
    use std::{fs, path::PathBuf};
    use tracing::debug;

    pub trait WorkspaceSource {
        fn load(&self) -> Result<Workspace>;
    }

    /// The built-in demo workspace.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SampleSeed;

    impl WorkspaceSource for SampleSeed {
        fn load(&self) -> Result<Workspace> {
            Ok(crate::seed::sample_workspace())
        }
    }

    /// A workspace snapshot stored as JSON.
    #[derive(Debug, Clone)]
    pub struct JsonFileSource {
        pub path: PathBuf,
    }

    impl JsonFileSource {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }
    }

    impl WorkspaceSource for JsonFileSource {
        fn load(&self) -> Result<Workspace> {
            let text = fs::read_to_string(&self.path)
                .with_context(|| format!("reading {:?}", self.path))?;
            let workspace = serde_json::from_str(&text)
                .with_context(|| format!("parsing workspace snapshot {:?}", self.path))?;
            debug!(path = ?self.path, "workspace snapshot loaded");
            Ok(workspace)
        }
    }

    /// Load from `source` and validate into a ready store.
    pub fn load_store(source: &dyn WorkspaceSource) -> Result<DocumentStore> {
        let workspace = source.load()?;
        DocumentStore::new(workspace).context("validating seed workspace")
    }

}

pub mod seed {
    //! The demo workspace: four top-level pages (one with a sub-page), eight tasks and
    //! three goals whose task lists are filled from the task collection. The demo inbox
    //! is dated relative to the moment it is built.

    use crate::core::*;
    use crate::inbox::*;
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid seed date")
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        date(y, m, d)
            .and_hms_opt(0, 0, 0)
            .expect("valid seed time")
            .and_utc()
    }

    fn b(id: &str, block_type: BlockType, content: &str) -> Block {
        Block::new(BlockId::from(id), block_type, content)
    }

    fn todo(id: &str, content: &str, checked: bool) -> Block {
        Block::todo(BlockId::from(id), content, checked)
    }

    fn task(id: &str, title: &str, completed: bool, priority: Priority) -> Task {
        let mut task = Task::new(TaskId::from(id), title, priority);
        task.completed = completed;
        task
    }

    pub fn sample_pages() -> Vec<Page> {
        use BlockType::*;

        let getting_started = Page::new("page-1".into(), "Getting Started")
            .with_icon("🚀")
            .with_blocks(vec![
                b("block-1", Heading1, "Welcome to Your Workspace"),
                b(
                    "block-2",
                    Text,
                    "This is your personal productivity hub. Use it to organize your thoughts, track tasks, and achieve your goals.",
                ),
                b("block-3", Heading2, "Quick Tips"),
                todo("block-4", "Press / to see all block types", true),
                todo("block-5", "Use the AI assistant for smart suggestions", false),
                todo("block-6", "Create nested pages for better organization", false),
                Block::divider("block-7".into()),
                b(
                    "block-8",
                    Quote,
                    "The secret of getting ahead is getting started. — Mark Twain",
                ),
            ])
            .with_timestamps(day(2024, 1, 15), day(2024, 1, 20));

        let meeting_notes = Page::new("page-2-1".into(), "Meeting Notes")
            .with_icon("📅")
            .with_blocks(vec![
                b("block-18", Heading1, "Weekly Standup - Jan 22"),
                b("block-19", Text, "Team discussed progress on current sprint."),
                b("block-20", Heading3, "Action Items"),
                todo("block-21", "Review PRs by Wednesday", false),
                todo("block-22", "Update documentation", false),
            ])
            .with_timestamps(day(2024, 1, 22), day(2024, 1, 22));

        let project_notes = Page::new("page-2".into(), "Project Notes")
            .with_icon("📝")
            .with_blocks(vec![
                b("block-9", Heading1, "Project Alpha"),
                b("block-10", Text, "Key objectives and milestones for Q1 2024."),
                b("block-11", Heading2, "Objectives"),
                todo("block-12", "Complete user research", true),
                todo("block-13", "Design system implementation", true),
                todo("block-14", "MVP development", false),
                todo("block-15", "Beta testing", false),
                b("block-16", Heading2, "Notes"),
                b(
                    "block-17",
                    Text,
                    "Focus on core features first. User feedback is crucial for iteration.",
                ),
            ])
            .with_child(meeting_notes)
            .with_timestamps(day(2024, 1, 10), day(2024, 1, 22));

        let ideas = Page::new("page-3".into(), "Ideas")
            .with_icon("💡")
            .with_blocks(vec![
                b("block-23", Heading1, "Idea Bank"),
                b("block-24", Text, "A collection of ideas to explore."),
                b("block-25", Toggle, "App Ideas").with_children(vec![
                    b("block-26", Text, "• Habit tracker with AI insights"),
                    b("block-27", Text, "• Smart reading list manager"),
                    b("block-28", Text, "• Collaborative whiteboard tool"),
                ]),
                b("block-29", Toggle, "Content Ideas").with_children(vec![
                    b("block-30", Text, "• Blog series on productivity"),
                    b("block-31", Text, "• Video tutorials on the app"),
                ]),
            ])
            .with_timestamps(day(2024, 1, 5), day(2024, 1, 18));

        let journal = Page::new("page-4".into(), "Daily Journal")
            .with_icon("📓")
            .with_blocks(vec![
                b("block-32", Heading1, "January 2024"),
                b("block-33", Heading2, "January 23"),
                b(
                    "block-34",
                    Text,
                    "Started the day with a productive morning routine. Completed the design review and made good progress on the frontend implementation.",
                ),
                b("block-35", Heading3, "Gratitude"),
                b(
                    "block-36",
                    Text,
                    "• Great coffee this morning\n• Helpful feedback from the team\n• Made progress on personal goals",
                ),
            ])
            .with_timestamps(day(2024, 1, 1), day(2024, 1, 23));

        vec![getting_started, project_notes, ideas, journal]
    }

    pub fn sample_tasks() -> Vec<Task> {
        use Priority::*;

        let on_page = |mut t: Task, page: &str| {
            t.page_id = Some(PageId::from(page));
            t
        };
        let for_goal = |mut t: Task, goal: &str| {
            t.goal_id = Some(GoalId::from(goal));
            t
        };

        vec![
            on_page(task("task-1", "Review PRs by Wednesday", false, High), "page-2-1"),
            on_page(task("task-2", "Update documentation", false, Medium), "page-2-1"),
            on_page(task("task-3", "Complete user research", true, High), "page-2"),
            on_page(task("task-4", "Design system implementation", true, High), "page-2"),
            for_goal(on_page(task("task-5", "MVP development", false, High), "page-2"), "goal-1"),
            for_goal(on_page(task("task-6", "Beta testing", false, Medium), "page-2"), "goal-1"),
            task("task-7", "Morning meditation", true, Low),
            for_goal(task("task-8", "Read for 30 minutes", false, Low), "goal-2"),
        ]
    }

    pub fn sample_goals(tasks: &[Task]) -> Vec<Goal> {
        let linked = |goal: &str| -> Vec<Task> {
            tasks
                .iter()
                .filter(|t| t.goal_id.as_ref().is_some_and(|g| g.as_str() == goal))
                .cloned()
                .collect()
        };
        vec![
            Goal {
                id: "goal-1".into(),
                title: "Launch MVP by Q1".into(),
                description: "Complete the minimum viable product and get it in front of beta users."
                    .into(),
                progress: 65,
                tasks: linked("goal-1"),
                due_date: Some(date(2024, 3, 31)),
            },
            Goal {
                id: "goal-2".into(),
                title: "Read 24 Books This Year".into(),
                description: "Read 2 books per month across various genres.".into(),
                progress: 8,
                tasks: linked("goal-2"),
                due_date: Some(date(2024, 12, 31)),
            },
            Goal {
                id: "goal-3".into(),
                title: "Build Consistent Habits".into(),
                description: "Establish a morning routine and maintain it for 90 days.".into(),
                progress: 40,
                tasks: vec![],
                due_date: Some(date(2024, 4, 15)),
            },
        ]
    }

    pub fn sample_workspace() -> Workspace {
        let tasks = sample_tasks();
        let goals = sample_goals(&tasks);
        Workspace {
            pages: sample_pages(),
            tasks,
            goals,
        }
    }

    fn contact(name: &str, email: &str) -> Contact {
        Contact {
            name: name.to_string(),
            email: email.to_string(),
        }
    }

    fn action(id: &str, kind: ActionKind, label: &str, description: &str) -> SuggestedAction {
        SuggestedAction {
            id: id.to_string(),
            kind,
            label: label.to_string(),
            description: description.to_string(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn extracted(dates: &[&str], people: &[&str], intent: Option<&str>, priority: Priority) -> ExtractedData {
        ExtractedData {
            dates: strings(dates),
            people: strings(people),
            intent: intent.map(str::to_string),
            priority: Some(priority),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn email(
        id: &str,
        thread: &str,
        from: Contact,
        subject: &str,
        snippet: &str,
        body: &str,
        received_at: NaiveDateTime,
        is_read: bool,
        labels: &[&str],
        category: EmailCategory,
    ) -> Email {
        Email {
            id: EmailId::from(id),
            thread_id: thread.to_string(),
            from,
            to: strings(&["you@example.com"]),
            subject: subject.to_string(),
            snippet: snippet.to_string(),
            body: body.to_string(),
            received_at,
            is_read,
            is_starred: false,
            labels: strings(labels),
            category,
            extracted_data: None,
            suggested_actions: vec![],
        }
    }

    pub fn sample_emails(now: NaiveDateTime) -> Vec<Email> {
        let hours_ago = |h: i64| now - Duration::hours(h);

        let mut roadmap = email(
            "email-1",
            "thread-1",
            contact("Sarah Chen", "sarah.chen@company.com"),
            "Quick sync on Q1 roadmap - Can we meet this week?",
            "Hi! I wanted to discuss the Q1 roadmap priorities. Are you free for a 30-min call this Thursday or Friday?",
            "Hi!\n\nI wanted to discuss the Q1 roadmap priorities and get your input on the feature prioritization. Are you free for a 30-min call this Thursday or Friday afternoon?\n\nLet me know what works best for you.\n\nBest,\nSarah",
            hours_ago(2),
            false,
            &["inbox", "work"],
            EmailCategory::Meeting,
        );
        roadmap.is_starred = true;
        roadmap.extracted_data = Some(extracted(
            &["Thursday", "Friday"],
            &["Sarah Chen"],
            Some("Meeting request for roadmap discussion"),
            Priority::High,
        ));
        roadmap.suggested_actions = vec![
            action("action-1", ActionKind::ScheduleMeeting, "Schedule Meeting", "Find available slots and reply"),
            action("action-2", ActionKind::Reply, "Quick Reply", "Draft a response"),
        ];

        let mut contract = email(
            "email-2",
            "thread-2",
            contact("Alex Kumar", "alex@startup.io"),
            "URGENT: Contract expires tomorrow - need signature",
            "The vendor contract expires tomorrow at midnight. Please review and sign ASAP.",
            "Hi,\n\nThis is a reminder that the vendor contract expires tomorrow at midnight EST. I've attached the renewal documents for your review.\n\nPlease sign and return by end of day today if possible.\n\nThanks,\nAlex",
            hours_ago(4),
            false,
            &["inbox", "urgent"],
            EmailCategory::Deadline,
        );
        contract.extracted_data = Some(extracted(
            &["tomorrow", "midnight", "end of day today"],
            &["Alex Kumar"],
            Some("Urgent contract signature required"),
            Priority::High,
        ));
        contract.suggested_actions = vec![
            action("action-3", ActionKind::CreateTask, "Create Task", "Add to tasks with deadline"),
            action("action-4", ActionKind::Reply, "Acknowledge", "Confirm receipt"),
        ];

        let mut digest = email(
            "email-3",
            "thread-3",
            contact("Marketing Team", "marketing@newsletter.com"),
            "Weekly digest: Top stories in tech",
            "This week in tech: AI breakthroughs, startup funding rounds, and more...",
            "Your weekly tech digest is here!\n\nTop Stories:\n1. OpenAI announces new model capabilities\n2. $50M Series B for productivity startup\n3. Remote work trends in 2024\n\nClick to read more...",
            hours_ago(24),
            true,
            &["inbox", "newsletters"],
            EmailCategory::LowPriority,
        );
        digest.extracted_data = Some(extracted(&[], &[], None, Priority::Low));

        let mut design = email(
            "email-4",
            "thread-4",
            contact("Jordan Lee", "jordan.lee@design.co"),
            "Re: Design feedback needed by Friday",
            "Thanks for the quick review! I've incorporated your suggestions. Could you take one more look?",
            "Hi!\n\nThanks for the quick review yesterday! I've incorporated your suggestions into the latest mockups.\n\nCould you take one more look before I send to the client on Friday?\n\nThe updated Figma link: [link]\n\nCheers,\nJordan",
            hours_ago(6),
            false,
            &["inbox", "design"],
            EmailCategory::Task,
        );
        design.extracted_data = Some(extracted(
            &["Friday"],
            &["Jordan Lee"],
            Some("Design review request"),
            Priority::Medium,
        ));
        design.suggested_actions = vec![
            action("action-5", ActionKind::CreateTask, "Add Review Task", "Review designs before Friday"),
            action("action-6", ActionKind::Reply, "Reply", "Confirm you'll review"),
        ];

        let mut follow_up = email(
            "email-5",
            "thread-5",
            contact("David Park", "david.park@consulting.com"),
            "Following up on our conversation",
            "Just checking in on the proposal we discussed last week. Any updates on your end?",
            "Hi there,\n\nI wanted to follow up on our conversation from last week about the consulting engagement.\n\nHave you had a chance to review the proposal? Happy to jump on a call if you have any questions.\n\nBest,\nDavid",
            hours_ago(48),
            true,
            &["inbox"],
            EmailCategory::FollowUp,
        );
        follow_up.extracted_data = Some(extracted(
            &[],
            &["David Park"],
            Some("Follow-up on proposal"),
            Priority::Medium,
        ));
        follow_up.suggested_actions = vec![
            action("action-7", ActionKind::FollowUp, "Set Reminder", "Follow up later this week"),
            action("action-8", ActionKind::Reply, "Reply Now", "Respond to follow-up"),
        ];

        vec![roadmap, contract, digest, design, follow_up]
    }

    pub fn sample_events(today: NaiveDate) -> Vec<CalendarEvent> {
        let at = |h: u32| today.and_hms_opt(h, 0, 0).expect("valid seed time");
        let event = |id: &str, title: &str, description: &str, start: u32, end: u32| CalendarEvent {
            id: EventId::from(id),
            title: title.to_string(),
            description: Some(description.to_string()),
            start: at(start),
            end: at(end),
            attendees: vec![],
            location: None,
            meeting_link: None,
            email_id: None,
            status: EventStatus::Confirmed,
        };

        let mut standup = event("event-1", "Team Standup", "Daily sync with the product team", 9, 9);
        standup.end = standup.start + Duration::minutes(30);
        standup.attendees = strings(&["team@company.com"]);

        let mut review = event("event-2", "Product Review", "Q1 feature review and planning", 14, 15);
        review.attendees = strings(&["product@company.com", "design@company.com"]);
        review.meeting_link = Some("https://meet.google.com/abc-defg-hij".to_string());

        let focus = event("event-3", "Focus Time", "Deep work block", 10, 12);

        vec![standup, review, focus]
    }

    pub fn sample_meeting_requests(now: NaiveDateTime) -> Vec<MeetingRequest> {
        let slot = |days: i64, score: u8| {
            let start = now + Duration::days(days);
            TimeSlot {
                start,
                end: start + Duration::minutes(30),
                score,
            }
        };
        vec![MeetingRequest {
            id: MeetingRequestId::from("meeting-req-1"),
            email_id: EmailId::from("email-1"),
            from: "sarah.chen@company.com".to_string(),
            subject: "Q1 Roadmap Sync".to_string(),
            proposed_times: vec![],
            suggested_slots: vec![slot(1, 95), slot(2, 85)],
            status: MeetingStatus::Pending,
            duration_minutes: 30,
        }]
    }

    /// The demo inbox as seen at `now` (local wall-clock time).
    pub fn sample_inbox(now: NaiveDateTime) -> Inbox {
        Inbox {
            emails: sample_emails(now),
            events: sample_events(now.date()),
            meeting_requests: sample_meeting_requests(now),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn sample_is_internally_consistent() {
            let ws = sample_workspace();
            assert_eq!(ws.validate(), Ok(()));
            assert_eq!(ws.pages.len(), 4);
            assert_eq!(ws.all_pages().len(), 5);
            assert_eq!(ws.pages[1].children[0].parent_id, Some(PageId::from("page-2")));
        }

        #[test]
        fn sample_inbox_links_request_to_its_message() {
            let now = day(2024, 1, 23).naive_utc();
            let inbox = sample_inbox(now);
            assert_eq!(inbox.emails.len(), 5);
            assert_eq!(inbox.events.len(), 3);
            let request = &inbox.meeting_requests[0];
            assert_eq!(
                inbox.find_email(&request.email_id).map(|e| e.category),
                Some(EmailCategory::Meeting)
            );
            assert!(inbox.emails.iter().all(|e| e.received_at < now));
        }

        #[test]
        fn goal_task_lists_follow_goal_ids() {
            let ws = sample_workspace();
            let counts: Vec<_> = ws.goals.iter().map(|g| g.tasks.len()).collect();
            assert_eq!(counts, [2, 1, 0]);
        }
    }
}

pub mod config {
    //! Session configuration, read from an optional JSON file. Missing keys fall back
    //! to defaults so a partial file is enough.

    use anyhow::{Context, Result};
    use serde::{Deserialize, Serialize};
    use std::{
        fs,
        path::{Path, PathBuf},
        time::Duration,
    };

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct AppConfig {
        pub assistant: AssistantConfig,
        /// Workspace snapshot to seed from instead of the built-in sample.
        pub seed: Option<PathBuf>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct AssistantConfig {
        pub reply_delay_ms: u64,
    }

    impl Default for AssistantConfig {
        fn default() -> Self {
            Self {
                reply_delay_ms: crate::assistant::DEFAULT_REPLY_DELAY.as_millis() as u64,
            }
        }
    }

    impl AssistantConfig {
        pub fn reply_delay(&self) -> Duration {
            Duration::from_millis(self.reply_delay_ms)
        }
    }

    pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
        let Some(path) = path else {
            return Ok(AppConfig::default());
        };
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {:?}", path))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn defaults_without_a_file() {
            let config = load_config(None).expect("defaults");
            assert_eq!(config.assistant.reply_delay(), Duration::from_millis(1500));
            assert_eq!(config.seed, None);
        }

        #[test]
        fn partial_file_keeps_other_defaults() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let path = tmp.path().join("pagespace.json");
            fs::write(&path, r#"{"assistant": {"reply_delay_ms": 10}}"#).expect("write config");

            let config = load_config(Some(path.as_path())).expect("load");
            assert_eq!(config.assistant.reply_delay_ms, 10);
            assert_eq!(config.seed, None);
        }

        #[test]
        fn malformed_file_reports_path() {
            let tmp = tempfile::tempdir().expect("tempdir");
            let path = tmp.path().join("broken.json");
            fs::write(&path, "{ nope").expect("write config");
            let err = load_config(Some(path.as_path())).unwrap_err();
            assert!(format!("{err:#}").contains("broken.json"));
        }
    }
}

pub use assistant::{ChatPanel, respond};
pub use store::{DocumentStore, Operation, Outcome};
