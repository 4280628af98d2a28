use core::marker::PhantomData;

use embassy_futures::select::{select3, Either3};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Instant, Timer};

use crate::config::NetRegConfig;
use crate::error::Error;
use crate::operator;
use crate::radio::types::Capabilities;
use crate::radio::urc::Indication;
use crate::radio::{
    RadioChannel, RadioEvent, RadioEventSubscription, RegistrationTarget, Request, RequestToken,
    Response, ResponseError,
};
use crate::scan::{ScanFinish, ScanSession, ScanStep};
use crate::signal::{percent_from_dbm, SignalSample};
use crate::slots::{RequestSlots, Slot};
use crate::timing::{
    legacy_query_timeout, scan_timeout, strength_retry_period, REGISTRATION_ATTEMPTS,
};
use crate::traits::{HomeNetworkInfo, ProvisioningLookup};

use super::state;
use super::{Command, NetRegEvent, NetRegPublisher};

pub(crate) const COMMAND_DEPTH: usize = 4;

struct RegisterAttempt {
    op: u32,
    target: RegistrationTarget,
    attempts: u8,
}

struct StrengthQuery {
    op: u32,
}

/// Armed timers, all multiplexed into the one event loop. A deadline is
/// disarmed by the path that completes its operation.
#[derive(Default)]
struct Deadlines {
    /// Zero-delay slot coalescing registration notifications.
    notify: Option<Instant>,
    /// Legacy-query or incremental-scan deadline of the active session.
    scan: Option<Instant>,
    /// Next strength-query retry.
    strength: Option<Instant>,
}

impl Deadlines {
    fn next(&self) -> Option<Instant> {
        [self.notify, self.scan, self.strength]
            .into_iter()
            .flatten()
            .min()
    }
}

/// Background event loop of the registration engine.
///
/// You must call `.run()` in a task for anything else to make progress. All
/// state is mutated from here; the host-facing handle only reads snapshots
/// and exchanges operations through the shared cells.
pub struct Runner<'a, R, P, H, C, const EVENT_CAP: usize>
where
    R: RadioChannel,
    P: ProvisioningLookup,
    H: HomeNetworkInfo,
    C: NetRegConfig,
{
    ch: state::Runner<'a>,
    radio: R,
    lookup: P,
    home: H,
    caps: Capabilities,

    events: RadioEventSubscription<'a, EVENT_CAP>,
    commands: Receiver<'a, NoopRawMutex, Command, COMMAND_DEPTH>,
    notifications: NetRegPublisher<'a>,

    slots: RequestSlots,
    scan: Option<ScanSession>,
    register: Option<RegisterAttempt>,
    strength: Option<StrengthQuery>,
    deadlines: Deadlines,
    next_token: u32,

    _config: PhantomData<C>,
}

impl<'a, R, P, H, C, const EVENT_CAP: usize> Runner<'a, R, P, H, C, EVENT_CAP>
where
    R: RadioChannel,
    P: ProvisioningLookup,
    H: HomeNetworkInfo,
    C: NetRegConfig,
{
    pub(crate) fn new(
        ch: state::Runner<'a>,
        radio: R,
        lookup: P,
        home: H,
        events: RadioEventSubscription<'a, EVENT_CAP>,
        commands: Receiver<'a, NoopRawMutex, Command, COMMAND_DEPTH>,
        notifications: NetRegPublisher<'a>,
    ) -> Self {
        let caps = Capabilities::of(radio.protocol_version());
        Self {
            ch,
            radio,
            lookup,
            home,
            caps,
            events,
            commands,
            notifications,
            slots: RequestSlots::new(),
            scan: None,
            register: None,
            strength: None,
            deadlines: Deadlines::default(),
            next_token: 0,
            _config: PhantomData,
        }
    }

    pub async fn run(&mut self) -> ! {
        loop {
            // With nothing armed, just pick a far-away wakeup.
            let timer = match self.deadlines.next() {
                Some(at) => Timer::at(at),
                None => Timer::at(Instant::now() + Duration::from_secs(3600)),
            };

            match select3(
                self.commands.receive(),
                self.events.next_message_pure(),
                timer,
            )
            .await
            {
                Either3::First(command) => self.handle_command(command).await,
                Either3::Second(event) => self.handle_event(event).await,
                Either3::Third(()) => self.handle_deadlines().await,
            }
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::ListOperators { op } => self.start_scan_session(op).await,
            Command::CurrentOperator { op } => {
                let operator = self.ch.with_tracker(|t| t.current_operator());
                self.ch.finish_operator(op, Ok(operator));
            }
            Command::Register { op, target } => {
                self.register = Some(RegisterAttempt {
                    op,
                    target,
                    attempts: 0,
                });
                self.submit_register().await;
            }
            Command::Strength { op } => {
                self.strength = Some(StrengthQuery { op });
                self.deadlines.strength = None;
                self.submit_strength().await;
            }
        }
    }

    async fn handle_event(&mut self, event: RadioEvent) {
        match event {
            RadioEvent::Completion { token, result } => match self.slots.complete(token) {
                Some(Slot::Scan) => {
                    if let Some(session) = &mut self.scan {
                        let step = session.on_response(result);
                        self.apply_scan_step(step).await;
                    }
                }
                Some(Slot::Register) => self.on_register_completion(result).await,
                Some(Slot::Strength) => self.on_strength_completion(result),
                None => trace!("dropping stale completion"),
            },
            RadioEvent::Indication(indication) => self.handle_indication(indication).await,
        }
    }

    async fn handle_indication(&mut self, indication: Indication) {
        match indication {
            Indication::ServingSystem(info) => {
                if self.ch.with_tracker(|t| t.update(&info)) {
                    // Coalesce event bursts into one deferred notification.
                    self.deadlines.notify = Some(Instant::now());
                }
            }
            Indication::SignalStrength(report) => {
                let dbm = SignalSample::from_report(&report).dbm();
                if dbm == 0 {
                    // No usable measurement.
                    return;
                }
                let percent = percent_from_dbm(dbm, C::WEAK_SIGNAL_DBM, C::STRONG_SIGNAL_DBM);
                if self.ch.update_signal_percent(percent) {
                    self.notifications
                        .publish_immediate(NetRegEvent::SignalStrength(percent));
                }
            }
            Indication::NetworkScan(result) => {
                if let Some(session) = &mut self.scan {
                    let step = session.on_scan_result(&result);
                    self.apply_scan_step(step).await;
                }
            }
            Indication::NetworkTime(time) => {
                self.notifications
                    .publish_immediate(NetRegEvent::NetworkTime(time));
            }
            Indication::ModemReset => self.on_modem_reset().await,
        }
    }

    async fn handle_deadlines(&mut self) {
        let now = Instant::now();

        if self.deadlines.notify.is_some_and(|at| at <= now) {
            self.deadlines.notify = None;
            let home = &self.home;
            if let Some(snapshot) = self.ch.with_tracker(|t| t.take_notification(home)) {
                info!("registration changed: {:?}", snapshot.status);
                self.notifications
                    .publish_immediate(NetRegEvent::RegistrationChanged(snapshot));
            }
        }

        if self.deadlines.scan.is_some_and(|at| at <= now) {
            self.deadlines.scan = None;
            if let Some(session) = &mut self.scan {
                let finish = session.on_timeout();
                self.complete_scan_session(finish).await;
            }
        }

        if self.deadlines.strength.is_some_and(|at| at <= now) {
            self.deadlines.strength = None;
            if self.strength.is_some() {
                self.submit_strength().await;
            }
        }
    }

    /// Submit on a slot, dropping whatever request the slot still holds. On
    /// submission failure the slot is left empty.
    async fn submit(&mut self, slot: Slot, request: Request) -> Result<(), Error> {
        self.next_token = self.next_token.wrapping_add(1);
        let token = RequestToken(self.next_token);

        if let Some(dropped) = self.slots.begin(slot, token) {
            self.radio.abandon(dropped).await;
        }

        match self.radio.submit(token, request).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("request submission failed: {:?}", slot);
                self.slots.clear(slot);
                Err(e.into())
            }
        }
    }

    async fn start_scan_session(&mut self, op: u32) {
        // A newer list request supersedes the active session; its waiter
        // resolves to Canceled through the shared cell.
        if let Some(old) = self.scan.take() {
            debug!("superseding active scan session");
            self.deadlines.scan = None;
            if let Some(token) = self.slots.clear(Slot::Scan) {
                self.radio.abandon(token).await;
            }
            if old.must_send_stop() {
                self.send_stop().await;
            }
        }

        let session = ScanSession::new(op, self.caps, C::NETWORK_SCAN, C::RAT_MODES);
        match self.submit(Slot::Scan, session.start_request()).await {
            Ok(()) => {
                self.deadlines.scan = Some(Instant::now() + legacy_query_timeout());
                self.scan = Some(session);
            }
            Err(e) => self.ch.finish_scan(op, Err(e)),
        }
    }

    async fn apply_scan_step(&mut self, step: ScanStep) {
        match step {
            ScanStep::Pending => {}
            ScanStep::StartScan(spec) => {
                self.deadlines.scan = None;
                match self
                    .submit(Slot::Scan, Request::StartNetworkScan(spec))
                    .await
                {
                    Ok(()) => self.deadlines.scan = Some(Instant::now() + scan_timeout()),
                    Err(e) => self.complete_scan_session(ScanFinish::Failed(e)).await,
                }
            }
            ScanStep::Finish(finish) => self.complete_scan_session(finish).await,
        }
    }

    async fn complete_scan_session(&mut self, finish: ScanFinish) {
        let Some(session) = self.scan.take() else {
            return;
        };
        self.deadlines.scan = None;
        if let Some(token) = self.slots.clear(Slot::Scan) {
            self.radio.abandon(token).await;
        }

        match finish {
            ScanFinish::Complete(mut list) => {
                operator::normalize(&mut list, &self.lookup, &self.home).await;
                self.ch.finish_scan(session.op(), Ok(list));
            }
            ScanFinish::Failed(e) => self.ch.finish_scan(session.op(), Err(e)),
            ScanFinish::Discarded => self.ch.finish_scan(session.op(), Err(Error::Canceled)),
        }

        if session.must_send_stop() {
            self.send_stop().await;
        }
    }

    /// Fire-and-forget scan stop; its completion is dropped as stale.
    async fn send_stop(&mut self) {
        self.next_token = self.next_token.wrapping_add(1);
        let token = RequestToken(self.next_token);
        let _ = self.radio.submit(token, Request::StopNetworkScan).await;
    }

    async fn submit_register(&mut self) {
        let Some(attempt) = &self.register else {
            return;
        };
        let op = attempt.op;
        let mut target = attempt.target.clone();

        if let RegistrationTarget::Manual { preferred, .. } = &mut target {
            if !self.caps.manual_rat_hint {
                *preferred = None;
            }
        }

        if let Err(e) = self
            .submit(Slot::Register, Request::SetRegistrationMode(target))
            .await
        {
            self.register = None;
            self.ch.finish_register(op, Err(e));
        }
    }

    async fn on_register_completion(&mut self, result: Result<Response, ResponseError>) {
        let Some(attempt) = self.register.as_mut() else {
            return;
        };

        if matches!(result, Ok(Response::RegistrationModeSet)) {
            let op = attempt.op;
            self.register = None;
            self.ch.finish_register(op, Ok(()));
            return;
        }

        attempt.attempts += 1;
        let op = attempt.op;
        if attempt.attempts >= REGISTRATION_ATTEMPTS {
            self.register = None;
            let error = match result {
                Err(e) => e.into(),
                Ok(_) => Error::InvalidResponse,
            };
            self.ch.finish_register(op, Err(error));
        } else {
            debug!("registration request failed, retrying");
            self.submit_register().await;
        }
    }

    async fn submit_strength(&mut self) {
        if self.strength.is_none() {
            return;
        }

        // The poller keeps retrying for as long as the query is pending.
        if self
            .submit(Slot::Strength, Request::GetSignalStrength)
            .await
            .is_err()
        {
            self.deadlines.strength = Some(Instant::now() + strength_retry_period());
        }
    }

    fn on_strength_completion(&mut self, result: Result<Response, ResponseError>) {
        let Some(query) = &self.strength else {
            return;
        };
        let op = query.op;

        match result {
            Ok(Response::SignalStrength(report)) => {
                let dbm = SignalSample::from_report(&report).dbm();
                if dbm == 0 {
                    self.deadlines.strength = Some(Instant::now() + strength_retry_period());
                    return;
                }

                let percent = percent_from_dbm(dbm, C::WEAK_SIGNAL_DBM, C::STRONG_SIGNAL_DBM);
                self.strength = None;
                self.deadlines.strength = None;
                self.ch.update_signal_percent(percent);
                self.ch.finish_strength(op, Ok(percent));
            }
            _ => {
                debug!("strength query failed, retrying");
                self.deadlines.strength = Some(Instant::now() + strength_retry_period());
            }
        }
    }

    async fn on_modem_reset(&mut self) {
        warn!("modem reset");

        // In-flight requests died with the modem. Their operations are
        // cleared without a failure report; the host re-issues them.
        self.slots.clear(Slot::Register);
        self.slots.clear(Slot::Strength);
        self.register = None;
        self.strength = None;
        self.deadlines.strength = None;

        if let Some(session) = &mut self.scan {
            let finish = session.on_modem_reset();
            self.complete_scan_session(finish).await;
        }
    }
}
