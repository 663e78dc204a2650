use std::collections::VecDeque;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::{BuilderConfig, ConfigError};
use crate::editor::{self, Edit};
use crate::identity::{group_at, relocate, ExpansionState, FocusStack};
use crate::metrics::{compute_metrics, ComplexityLevel, RuleMetrics};
use crate::serial::{self, SerializeError};
use crate::sink::{
    EvaluationRequest, EvaluationResponse, EvaluationSink, EvaluationUnavailable,
    SampleDataSource, SaveSink,
};
use crate::validate::{validate, ValidationReport};
use crate::{Condition, EditError, NodePath, RuleError, RuleTree};

/// The rule currently being edited, with everything the editor screen keeps
/// around it: undo history, tree-view state, the last preview, and the
/// test data for evaluation.
///
/// All mutation of the tree goes through [`Edit`] intents, so every change
/// can be undone by restoring the previous snapshot. Expansion flags and
/// focus crumbs are keyed by path; after each edit they are moved to where
/// their groups went, and dropped when the group is gone.
#[derive(Debug, Clone)]
pub struct BuilderSession {
    config: BuilderConfig,
    tree: RuleTree,
    history: VecDeque<Snapshot>,
    expansion: ExpansionState,
    focus: FocusStack,
    preview: Option<String>,
    show_validation: bool,
    test_data: Option<Value>,
}

/// Tree and the view state that was keyed to it.
#[derive(Debug, Clone)]
struct Snapshot {
    tree: RuleTree,
    expansion: ExpansionState,
    focus: FocusStack,
}

impl Default for BuilderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BuilderSession {
    #[must_use]
    pub fn new() -> Self {
        Self::build(BuilderConfig::default())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` does not validate.
    pub fn with_config(config: BuilderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: BuilderConfig) -> Self {
        Self {
            expansion: ExpansionState::with_default(config.expanded_by_default),
            config,
            tree: RuleTree::new(),
            history: VecDeque::new(),
            focus: FocusStack::new(),
            preview: None,
            show_validation: false,
            test_data: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    #[must_use]
    pub fn tree(&self) -> &RuleTree {
        &self.tree
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.tree.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.tree.description = description.into();
    }

    // -- editing ------------------------------------------------------------

    /// Apply one edit. On error the tree is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`EditError`] if the edit does not address a valid node.
    pub fn apply(&mut self, edit: &Edit) -> Result<(), EditError> {
        let next = editor::apply(&self.tree, edit)?;

        let mut expansion = self.expansion.clone();
        let mut focus = self.focus.clone();
        let before = self.tree.root();
        let moved = |path: &NodePath| {
            relocate(before, edit, path).filter(|to| group_at(next.root(), to).is_some())
        };
        expansion.remap(moved);
        focus.remap(moved);

        self.commit(Snapshot {
            tree: next,
            expansion,
            focus,
        });
        Ok(())
    }

    /// Append a condition pre-filled with the configured default field.
    ///
    /// # Errors
    ///
    /// Returns [`EditError`] if `group` does not name a group.
    pub fn add_condition(&mut self, group: NodePath) -> Result<(), EditError> {
        let condition = Condition {
            field: self.config.default_field.clone(),
            ..Condition::default()
        };
        self.apply(&Edit::AddCondition { group, condition })
    }

    /// Replace the whole tree, e.g. with an imported rule. Undoable.
    pub fn load(&mut self, tree: RuleTree) {
        self.commit(Snapshot {
            tree,
            expansion: ExpansionState::with_default(self.config.expanded_by_default),
            focus: FocusStack::new(),
        });
    }

    /// Parse a JSON rule and load it.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] if `text` is not a JSON rule; the current
    /// tree is kept.
    pub fn import(&mut self, text: &str) -> Result<(), SerializeError> {
        let tree = serial::from_str(text)?;
        self.load(tree);
        Ok(())
    }

    fn commit(&mut self, next: Snapshot) {
        let previous = self.restore(next);
        if self.config.history_limit > 0 {
            self.history.push_back(previous);
            if self.history.len() > self.config.history_limit {
                self.history.pop_front();
            }
        }
    }

    /// Install `snapshot`, returning the one it replaces.
    fn restore(&mut self, snapshot: Snapshot) -> Snapshot {
        self.preview = None;
        Snapshot {
            tree: std::mem::replace(&mut self.tree, snapshot.tree),
            expansion: std::mem::replace(&mut self.expansion, snapshot.expansion),
            focus: std::mem::replace(&mut self.focus, snapshot.focus),
        }
    }

    /// Restore the tree and view state from before the last edit. Returns
    /// false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop_back() {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Back to an empty rule. Test data is kept.
    pub fn reset(&mut self) {
        self.tree = RuleTree::new();
        self.history.clear();
        self.expansion = ExpansionState::with_default(self.config.expanded_by_default);
        self.focus.clear();
        self.preview = None;
        self.show_validation = false;
        info!("builder reset");
    }

    // -- display ------------------------------------------------------------

    #[must_use]
    pub fn metrics(&self) -> RuleMetrics {
        compute_metrics(&self.tree)
    }

    #[must_use]
    pub fn complexity(&self) -> ComplexityLevel {
        self.metrics().level_with(&self.config.thresholds)
    }

    #[must_use]
    pub fn validation(&self) -> ValidationReport {
        validate(&self.tree)
    }

    /// Whether validation messages should be on screen. Set by a rejected
    /// save and cleared once the rule validates again.
    #[must_use]
    pub fn show_validation(&self) -> bool {
        self.show_validation && !self.validation().is_valid()
    }

    #[must_use]
    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn expansion_mut(&mut self) -> &mut ExpansionState {
        &mut self.expansion
    }

    pub fn expand_all(&mut self) {
        self.expansion.expand_all(self.tree.root());
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all(self.tree.root());
    }

    #[must_use]
    pub fn focus(&self) -> &FocusStack {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut FocusStack {
        &mut self.focus
    }

    /// Render the JSON preview and keep it until the next edit.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] if the JSON writer fails.
    pub fn preview(&mut self) -> Result<&str, SerializeError> {
        let text = serial::to_string_pretty(&self.tree)?;
        Ok(self.preview.insert(text).as_str())
    }

    /// The last rendered preview, if no edit happened since.
    #[must_use]
    pub fn last_preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    // -- save and evaluate ---------------------------------------------------

    /// Validate, hand the envelope to `sink`, and reset on success.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Validation`] with every issue if the rule is
    /// incomplete (the sink is not called), or [`RuleError::Sink`] if the
    /// sink fails (the rule is kept).
    pub fn save<S: SaveSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), RuleError> {
        if let Err(failed) = validate(&self.tree).into_result() {
            self.show_validation = true;
            warn!(issues = failed.issues.len(), "save rejected: rule is incomplete");
            return Err(failed.into());
        }

        let envelope = serial::to_json(&self.tree);
        if let Err(e) = sink.save(&envelope) {
            warn!(error = %e, "save sink failed");
            return Err(e.into());
        }

        info!(rule = %self.tree.name, "rule saved");
        self.reset();
        Ok(())
    }

    #[must_use]
    pub fn test_data(&self) -> Option<&Value> {
        self.test_data.as_ref()
    }

    pub fn set_test_data(&mut self, data: Value) {
        self.test_data = Some(data);
    }

    /// Set test data from text typed by the user.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidData`] if `text` is not JSON; the previous
    /// data is kept.
    pub fn set_test_data_text(&mut self, text: &str) -> Result<(), RuleError> {
        let data = serde_json::from_str(text).map_err(RuleError::InvalidData)?;
        self.test_data = Some(data);
        Ok(())
    }

    /// Replace the test data with the source's sample document.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Sink`] if the source fails.
    pub fn load_sample<D: SampleDataSource + ?Sized>(&mut self, source: &D) -> Result<(), RuleError> {
        let sample = source.sample()?;
        self.test_data = Some(sample);
        Ok(())
    }

    /// Evaluate the current rule against the test data (an empty object when
    /// none is set). Returns whether the data satisfies the rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Validation`] if the rule is incomplete, or
    /// [`RuleError::Evaluation`] if the service fails or reports failure.
    /// The rule and the test data are kept either way.
    pub fn evaluate<E: EvaluationSink + ?Sized>(&mut self, sink: &E) -> Result<bool, RuleError> {
        if let Err(failed) = validate(&self.tree).into_result() {
            self.show_validation = true;
            return Err(failed.into());
        }

        let request = EvaluationRequest {
            business_logic: serial::group_to_json(self.tree.root()),
            data: self
                .test_data
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new())),
        };

        let response = sink.evaluate(&request).map_err(|e| EvaluationUnavailable {
            reason: e.to_string(),
        });
        match response.and_then(EvaluationResponse::into_result) {
            Ok(passed) => {
                info!(rule = %self.tree.name, passed, "rule evaluated");
                Ok(passed)
            }
            Err(unavailable) => {
                warn!(reason = %unavailable.reason, "evaluation unavailable");
                Err(unavailable.into())
            }
        }
    }
}
