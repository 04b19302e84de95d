use std::{collections::HashSet, sync::Arc, time::Duration};

use anyhow::Result;
use parking_lot::Mutex;
use tokio::{sync::mpsc, time::sleep};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};

use crate::{
    config::SchedulerConfig,
    domain::ScanReason,
    hosts,
    infrastructure::shutdown::ShutdownListener,
    page::{ElementHandle, HostPage, PageEvent},
    scan::{automator, MarkerRegistry, ScanProcessor},
    tasks::debounce::DebouncedTrigger,
};

/// Register the fixed-interval rescans. Specs use six-field cron with a
/// seconds column, e.g. `*/30 * * * * *`.
pub async fn configure_rescan_jobs(
    cron_specs: &[String],
    processor: Arc<ScanProcessor>,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    for spec in cron_specs {
        let processor = processor.clone();
        let job = Job::new_async(spec.as_str(), move |_id, _l| {
            let processor = processor.clone();
            Box::pin(async move {
                processor.run_pass(ScanReason::Interval).await;
            })
        })?;
        scheduler.add(job).await?;
        info!(target: "scheduler", cron = %spec, "rescan job registered");
    }
    scheduler.start().await?;
    Ok(scheduler)
}

/// Owns the only control loop: one startup scan after a settle delay,
/// debounced mutation scans, and manual-control dispatch. Passes are
/// spawned, never awaited, so the loop is idle again immediately and
/// overlap stays safe behind the marker registry.
pub struct Scheduler {
    processor: Arc<ScanProcessor>,
    page: Arc<dyn HostPage>,
    markers: Arc<MarkerRegistry>,
    events: mpsc::Receiver<PageEvent>,
    config: SchedulerConfig,
    manual_in_flight: Arc<Mutex<HashSet<ElementHandle>>>,
}

impl Scheduler {
    pub fn new(
        processor: Arc<ScanProcessor>,
        page: Arc<dyn HostPage>,
        markers: Arc<MarkerRegistry>,
        events: mpsc::Receiver<PageEvent>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            processor,
            page,
            markers,
            events,
            config,
            manual_in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn run(mut self, mut shutdown: ShutdownListener) {
        tokio::select! {
            _ = sleep(self.config.settle_delay) => {}
            _ = shutdown.notified() => return,
        }
        spawn_pass(&self.processor, ScanReason::Startup);

        let (trigger, mut scans) = DebouncedTrigger::new(self.config.mutation_quiet);
        let mut events = self.events;
        loop {
            tokio::select! {
                _ = shutdown.notified() => break,
                Some(()) = scans.recv() => {
                    spawn_pass(&self.processor, ScanReason::Mutation);
                }
                event = events.recv() => match event {
                    Some(PageEvent::Mutation) => trigger.signal(),
                    Some(PageEvent::ManualAction { element }) => {
                        // Only rows this process highlighted carry the
                        // manual control; anything else is a stray event.
                        if !self.markers.is_highlighted(&element) {
                            debug!(target: "scheduler", element = %element.0, "manual action for an unmarked row; ignored");
                            continue;
                        }
                        handle_manual_action(
                            &self.page,
                            &self.manual_in_flight,
                            self.config.action_cooldown,
                            element,
                        );
                    }
                    None => {
                        warn!(target: "scheduler", "page event stream closed");
                        break;
                    }
                },
            }
        }
        info!(target: "scheduler", "scan loop stopped");
    }
}

fn spawn_pass(processor: &Arc<ScanProcessor>, reason: ScanReason) {
    let processor = processor.clone();
    tokio::spawn(async move {
        processor.run_pass(reason).await;
    });
}

fn handle_manual_action(
    page: &Arc<dyn HostPage>,
    in_flight: &Arc<Mutex<HashSet<ElementHandle>>>,
    cooldown: Duration,
    element: ElementHandle,
) {
    if !in_flight.lock().insert(element.clone()) {
        debug!(target: "scheduler", element = %element.0, "manual action already in progress");
        return;
    }
    let page = page.clone();
    let in_flight = in_flight.clone();
    tokio::spawn(async move {
        run_manual_action(page, element.clone(), cooldown).await;
        in_flight.lock().remove(&element);
    });
}

/// Manual control press: attempt the automator regardless of the
/// auto-action setting, hold the control in its busy state for the
/// cool-down, then reset it. Success of the action is never verified.
async fn run_manual_action(page: Arc<dyn HostPage>, element: ElementHandle, cooldown: Duration) {
    let url = match page.url().await {
        Ok(url) => url,
        Err(err) => {
            warn!(target: "scheduler", error = %err, "manual action: cannot read page url");
            return;
        }
    };
    let Some(selectors) = hosts::detect_host(&url).selectors() else {
        warn!(target: "scheduler", "manual action on unsupported host");
        return;
    };
    if let Err(err) = page.set_control_busy(&element, true).await {
        debug!(target: "scheduler", element = %element.0, error = %err, "could not mark control busy");
    }
    let attempted = automator::move_to_spam(page.clone(), selectors, element.clone()).await;
    if !attempted {
        debug!(target: "scheduler", element = %element.0, "manual action could not be dispatched");
    }
    sleep(cooldown).await;
    if let Err(err) = page.set_control_busy(&element, false).await {
        debug!(target: "scheduler", element = %element.0, error = %err, "could not reset control");
    }
}
