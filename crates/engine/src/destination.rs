//! Destination resolution: find or create the target folder under the personal root.

use std::time::Duration;

use tracing::{debug, info};

use sumo_import_client::ContentApi;
use sumo_import_core::DestinationFolder;

use crate::error::ImportError;

/// Return the personal child folder called `name`, creating it when absent.
///
/// Children are scanned in the order the remote returns them and the first
/// exact name match wins. A newly created folder is followed by a `settle`
/// wait before the caller submits anything into it.
pub async fn resolve_destination(
    api: &dyn ContentApi,
    name: &str,
    settle: Duration,
) -> Result<DestinationFolder, ImportError> {
    let root = api.personal_folder().await?;
    debug!(
        root_id = %root.id,
        children = root.children.len(),
        "Personal folder listed"
    );

    let destination = match root.children.iter().find(|child| child.name == name) {
        Some(existing) => DestinationFolder {
            id: existing.id.clone(),
            name: existing.name.clone(),
            created: false,
        },
        None => {
            let created = api.create_folder(name, &root.id).await?;
            tokio::time::sleep(settle).await;
            DestinationFolder {
                id: created.id,
                name: created.name,
                created: true,
            }
        }
    };

    info!(
        "{}:: {} - {}",
        destination.tag(),
        destination.id,
        destination.name
    );

    Ok(destination)
}
