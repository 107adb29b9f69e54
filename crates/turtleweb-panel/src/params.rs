//! [`ParameterMirror`] – local ordered copy of the node's background
//! color parameters.
//!
//! The mirror is optimistic: an edit is pushed upstream and the local
//! list is updated without re-reading the remote value, so local and
//! remote state can diverge if the remote rejects the write. A failed
//! push propagates to the handler boundary and leaves the local list
//! untouched.

use std::sync::Arc;

use turtleweb_client::Ros2Client;
use turtleweb_types::{PanelError, ParamEdit, Parameter, StatePatch};

use crate::state::StateStore;

/// The fixed parameter set mirrored from the simulation node.
pub const PARAM_NAMES: [&str; 3] = ["background_b", "background_g", "background_r"];

pub struct ParameterMirror {
    client: Arc<dyn Ros2Client>,
    state: Arc<StateStore>,
}

impl ParameterMirror {
    pub fn new(client: Arc<dyn Ros2Client>, state: Arc<StateStore>) -> Self {
        Self { client, state }
    }

    /// Fetch the fixed parameter set from the node named in the state
    /// and replace the mirrored list wholesale. Called once after a
    /// successful launch.
    ///
    /// `node_name` is read from the state here, after the spawn await;
    /// it is effectively immutable, so the unguarded read is accepted.
    pub async fn fetch(&self) -> Result<(), PanelError> {
        let node = self.state.snapshot().node_name;
        let names: Vec<String> = PARAM_NAMES.iter().map(|n| n.to_string()).collect();
        let values = self.client.get_parameters(&node, &names).await?;
        let params: Vec<Parameter> = names
            .into_iter()
            .zip(values)
            .map(|(name, value)| Parameter {
                id: format!("param-{name}"),
                name,
                value,
            })
            .collect();
        self.state.set(StatePatch {
            params: Some(params),
            ..Default::default()
        });
        Ok(())
    }

    /// Push one edit upstream, then replace the matching local entry in
    /// place. Order and all other entries are preserved; an `id` with no
    /// local match leaves the list unchanged (silent no-op, not an
    /// error).
    pub async fn apply_edit(&self, edit: ParamEdit) -> Result<(), PanelError> {
        let node = self.state.snapshot().node_name;
        let edited = Parameter {
            id: edit.id,
            name: edit.name,
            value: edit.value,
        };
        self.client
            .set_parameters(&node, std::slice::from_ref(&edited))
            .await?;

        let params: Vec<Parameter> = self
            .state
            .snapshot()
            .params
            .into_iter()
            .map(|prev| {
                if prev.id == edited.id {
                    edited.clone()
                } else {
                    prev
                }
            })
            .collect();
        self.state.set(StatePatch {
            params: Some(params),
            ..Default::default()
        });
        Ok(())
    }
}
