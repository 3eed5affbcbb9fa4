use std::num::NonZeroU32;

use tracing::info;

use super::*;
use crate::session::{ModelSpec, Task};
use crate::setup::SetupError;

impl EguiController {
    /// "validate task".
    pub fn apply_task(&mut self, task: Task) {
        match self.session.set_task(task) {
            Ok(()) => {
                self.ui.task.selected = task;
                self.ui.task.editing = false;
                info!(%task, "task selected");
                self.set_status(format!("task: {task}"), StatusTone::Info);
            }
            Err(err) => self.set_status(err.to_string(), StatusTone::Error),
        }
    }

    /// "validate models": push the drafted device, data init and model list.
    pub fn apply_models(&mut self) {
        match self.commit_model_drafts() {
            Ok(count) => {
                self.ui.models.editing = false;
                self.ui.models.applied = true;
                info!(models = count, "models configured");
                self.set_status(format!("{count} model(s) configured"), StatusTone::Info);
            }
            Err(err) => {
                self.ui.models.load_from(self.session.config());
                self.set_status(err.to_string(), StatusTone::Error);
            }
        }
    }

    fn commit_model_drafts(&mut self) -> Result<usize, SetupError> {
        let form = self.ui.models.clone();
        let limits = self.session.limits();
        if form.drafts.len() > limits.max_models {
            return Err(SetupError::TooManyModels {
                requested: form.drafts.len(),
                max: limits.max_models,
            });
        }
        let mut specs = Vec::with_capacity(form.drafts.len());
        for draft in &form.drafts {
            let replicas = NonZeroU32::new(draft.replicas).ok_or(SetupError::ZeroReplicas)?;
            if replicas.get() > limits.max_replicas {
                return Err(SetupError::TooManyReplicas {
                    requested: replicas.get(),
                    max: limits.max_replicas,
                });
            }
            specs.push(ModelSpec::new(draft.strategy, replicas));
        }
        self.session.set_device(form.device)?;
        self.session.set_fixed_data_init(form.fixed_data_init)?;
        self.session.set_model_count(specs.len())?;
        for (position, spec) in specs.into_iter().enumerate() {
            self.session.set_model(position + 1, spec)?;
        }
        Ok(form.drafts.len())
    }
}
