use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use tokio::{sync::broadcast, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::error::SchedulingError;
use crate::{log_debug, log_error, log_info, log_warn};

use super::{NotificationCenter, NotificationContent, NotificationRequest, TriggerSchedule};

const ENABLE_LOGS: bool = true;
const DELIVERY_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct DeliveredNotification {
    pub identifier: String,
    pub content: NotificationContent,
    pub delivered_at: DateTime<Utc>,
    pub badge_count: u32,
}

struct PendingTrigger {
    request: NotificationRequest,
    cancel: CancellationToken,
    _handle: JoinHandle<()>,
}

struct Delivery {
    authorized: AtomicBool,
    badge: AtomicU32,
    sender: broadcast::Sender<DeliveredNotification>,
}

impl Delivery {
    fn deliver(&self, request: &NotificationRequest) {
        if !self.authorized.load(Ordering::SeqCst) {
            log_debug!(
                "Suppressed notification {} (not authorized)",
                request.identifier
            );
            return;
        }

        let badge_count = self
            .badge
            .fetch_add(request.content.badge, Ordering::SeqCst)
            .saturating_add(request.content.badge);

        log_info!("Delivering \"{}\"", request.content.body);

        // No subscribers is fine: the notification was still "shown".
        let _ = self.sender.send(DeliveredNotification {
            identifier: request.identifier.clone(),
            content: request.content.clone(),
            delivered_at: Utc::now(),
            badge_count,
        });
    }
}

/// In-process notification center. Every pending request is a tokio task
/// sleeping until its next fire time; deliveries are published on a
/// broadcast channel.
pub struct LocalNotificationCenter {
    pending: Mutex<HashMap<String, PendingTrigger>>,
    delivery: Arc<Delivery>,
    grant_permission: bool,
}

impl LocalNotificationCenter {
    pub fn new() -> Self {
        Self::with_permission(true)
    }

    /// `grant_permission` is the answer the simulated user gives to
    /// [`NotificationCenter::request_authorization`].
    pub fn with_permission(grant_permission: bool) -> Self {
        let (sender, _) = broadcast::channel(DELIVERY_BUFFER);
        Self {
            pending: Mutex::new(HashMap::new()),
            delivery: Arc::new(Delivery {
                authorized: AtomicBool::new(false),
                badge: AtomicU32::new(0),
                sender,
            }),
            grant_permission,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeliveredNotification> {
        self.delivery.sender.subscribe()
    }

    pub fn badge_count(&self) -> u32 {
        self.delivery.badge.load(Ordering::SeqCst)
    }

    pub fn is_authorized(&self) -> bool {
        self.delivery.authorized.load(Ordering::SeqCst)
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<String, PendingTrigger>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LocalNotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LocalNotificationCenter {
    fn drop(&mut self) {
        for (_, trigger) in self.lock_pending().drain() {
            trigger.cancel.cancel();
        }
    }
}

#[async_trait]
impl NotificationCenter for LocalNotificationCenter {
    async fn request_authorization(&self) -> Result<bool, SchedulingError> {
        self.delivery
            .authorized
            .store(self.grant_permission, Ordering::SeqCst);
        Ok(self.grant_permission)
    }

    async fn add(&self, request: NotificationRequest) -> Result<(), SchedulingError> {
        if next_wait(&request.schedule, None).is_none() {
            return Err(SchedulingError::Platform(format!(
                "trigger {} has no future fire date",
                request.identifier
            )));
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(trigger_loop(
            request.clone(),
            cancel.clone(),
            self.delivery.clone(),
        ));

        let replaced = self.lock_pending().insert(
            request.identifier.clone(),
            PendingTrigger {
                request,
                cancel,
                _handle: handle,
            },
        );

        if let Some(previous) = replaced {
            previous.cancel.cancel();
            log_debug!("Replaced pending trigger {}", previous.request.identifier);
        }

        Ok(())
    }

    async fn remove_pending(&self, identifiers: &[String]) -> Result<(), SchedulingError> {
        let mut pending = self.lock_pending();
        for identifier in identifiers {
            if let Some(trigger) = pending.remove(identifier) {
                trigger.cancel.cancel();
            }
        }
        Ok(())
    }

    async fn remove_all_pending(&self) -> Result<(), SchedulingError> {
        let mut pending = self.lock_pending();
        let count = pending.len();
        for (_, trigger) in pending.drain() {
            trigger.cancel.cancel();
        }
        log_debug!("Removed {} pending triggers", count);
        Ok(())
    }

    async fn set_badge_count(&self, count: u32) -> Result<(), SchedulingError> {
        self.delivery.badge.store(count, Ordering::SeqCst);
        Ok(())
    }

    async fn pending_requests(&self) -> Result<Vec<NotificationRequest>, SchedulingError> {
        let mut requests: Vec<_> = self
            .lock_pending()
            .values()
            .map(|trigger| trigger.request.clone())
            .collect();
        requests.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(requests)
    }
}

async fn trigger_loop(
    request: NotificationRequest,
    cancel: CancellationToken,
    delivery: Arc<Delivery>,
) {
    let mut last_fire: Option<DateTime<Local>> = None;
    loop {
        let Some((wait, fire_at)) = next_wait(&request.schedule, last_fire.as_ref()) else {
            log_error!("Trigger {} lost its next fire date", request.identifier);
            break;
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = time::sleep(wait) => {}
        }

        if cancel.is_cancelled() {
            break;
        }
        delivery.deliver(&request);
        last_fire = fire_at;
    }
}

/// Time to sleep before the next delivery, plus the wall-clock instant it
/// stands for when the schedule is calendar based.
fn next_wait(
    schedule: &TriggerSchedule,
    last_fire: Option<&DateTime<Local>>,
) -> Option<(Duration, Option<DateTime<Local>>)> {
    match *schedule {
        TriggerSchedule::Daily { hour, minute } => {
            let (fire_at, wait) = daily_wait(&Local::now(), last_fire, hour, minute)?;
            Some((wait, Some(fire_at)))
        }
        TriggerSchedule::Interval { every } if every.is_zero() => None,
        TriggerSchedule::Interval { every } => Some((every, None)),
    }
}

/// Next daily fire after both `now` and `last_fire`, with the wait from
/// `now`. The sleep runs on the monotonic clock, so it can end while the
/// wall clock still reads just before the previous fire time; counting from
/// `last_fire` keeps that slot from being delivered twice.
fn daily_wait<Tz: TimeZone>(
    now: &DateTime<Tz>,
    last_fire: Option<&DateTime<Tz>>,
    hour: u32,
    minute: u32,
) -> Option<(DateTime<Tz>, Duration)> {
    let after = match last_fire {
        Some(previous) if previous > now => previous,
        _ => now,
    };
    let fire_at = next_daily_fire(after, hour, minute)?;
    let wait = (fire_at.clone() - now.clone()).to_std().ok()?;
    Some((fire_at, wait))
}

/// First instant strictly after `now` whose local wall clock reads
/// `hour:minute`. A wall-clock time skipped by a DST jump rolls forward one
/// hour. Returns `None` for an invalid time of day.
pub fn next_daily_fire<Tz: TimeZone>(
    now: &DateTime<Tz>,
    hour: u32,
    minute: u32,
) -> Option<DateTime<Tz>> {
    let time_of_day = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let tz = now.timezone();
    let today = now.date_naive();

    let today_fire = resolve_wall_clock(&tz, today.and_time(time_of_day))?;
    if today_fire > *now {
        return Some(today_fire);
    }

    let tomorrow = today.succ_opt()?;
    let next = resolve_wall_clock(&tz, tomorrow.and_time(time_of_day));
    if next.is_none() {
        log_warn!("Could not resolve {} in local time", tomorrow.and_time(time_of_day));
    }
    next
}

fn resolve_wall_clock<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest().or_else(|| {
        tz.from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
    })
}
