use crate::render::{DashboardView, Widget, render};
use crate::store::StoreSnapshot;
use tokio::sync::watch::Receiver;
use tracing::{debug, info, instrument};

/// Re-renders the dashboard for every published snapshot.
#[instrument(skip_all)]
pub async fn store_listener(mut rx: Receiver<StoreSnapshot>) {
    let mut current = render(&rx.borrow_and_update());
    info!("🖥️ {}", current);

    while rx.changed().await.is_ok() {
        let next = render(&rx.borrow_and_update());

        if next.status != current.status {
            info!(was = current.status, "🖥️ Status: {}", next.status);
        }
        for (utility, widget) in changed_widgets(&current, &next) {
            info!(utility, classes = ?widget.classes(), "🖥️ {} {}", utility, widget);
        }
        debug!("🖥️ {}", next);

        current = next;
    }
}

fn changed_widgets<'a>(current: &DashboardView, next: &'a DashboardView) -> Vec<(&'a str, &'a Widget)> {
    next.widgets
        .iter()
        .filter(|(utility, widget)| current.widgets.get(*utility) != Some(*widget))
        .map(|(utility, widget)| (utility.as_str(), widget))
        .collect()
}
