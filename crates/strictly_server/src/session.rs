//! Matchmaking and match sessions.
//!
//! A [`SessionManager`] owns the waiting queue, the running matches and the
//! participant-to-match map. The registry sits behind one mutex; each match
//! has its own mutex, and the registry lock is never held while a match is
//! mutated. Intents for one match are applied one at a time in arrival
//! order; out-of-turn intents are refused, never queued.

use crate::adapter;
use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::protocol::{
    ClientMessage, ColorPair, MatchId, ParticipantId, ResumeToken, ServerMessage, Snapshot,
};
use derive_new::new;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strictly_backgammon::{Color, Match, Progress};
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Channel carrying messages to one client connection.
pub type Outbox = mpsc::Sender<ServerMessage>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn deliver(outbox: &Outbox, message: ServerMessage) {
    if let Err(err) = outbox.try_send(message) {
        match err {
            mpsc::error::TrySendError::Full(dropped) => {
                warn!(?dropped, "Outbox full, dropping message");
            }
            mpsc::error::TrySendError::Closed(_) => {
                debug!("Outbox closed");
            }
        }
    }
}

/// Delivers `messages` in order, finishing in the background once the
/// outbox fills up. Final messages of a match go through here.
fn deliver_all(outbox: &Outbox, messages: Vec<ServerMessage>) {
    let mut pending = messages.into_iter();
    while let Some(message) = pending.next() {
        match outbox.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Outbox closed");
                return;
            }
            Err(mpsc::error::TrySendError::Full(message)) => {
                let rest: Vec<ServerMessage> = std::iter::once(message).chain(pending).collect();
                match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        debug!(waiting = rest.len(), "Outbox full, delivering in background");
                        let outbox = outbox.clone();
                        runtime.spawn(async move {
                            for message in rest {
                                if outbox.send(message).await.is_err() {
                                    break;
                                }
                            }
                        });
                    }
                    Err(_) => warn!(dropped = rest.len(), "Outbox full and no runtime, dropping"),
                }
                return;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Connection
// ─────────────────────────────────────────────────────────────

/// One client connection as the session manager sees it.
#[derive(Debug, Clone)]
pub struct Connection {
    outbox: Outbox,
    participant: Option<ParticipantId>,
}

impl Connection {
    /// Wraps the sending half of a connection's outbound channel.
    pub fn new(outbox: Outbox) -> Self {
        Self {
            outbox,
            participant: None,
        }
    }

    /// The participant this connection speaks for, once queued or resumed.
    pub fn participant(&self) -> Option<ParticipantId> {
        self.participant
    }

    /// Sends `message` to this connection only.
    pub fn send(&self, message: ServerMessage) {
        deliver(&self.outbox, message);
    }
}

// ─────────────────────────────────────────────────────────────
//  Sessions
// ─────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Seat {
    participant: ParticipantId,
    token: ResumeToken,
    name: String,
    outbox: Option<Outbox>,
    /// Bumped on every disconnect and resume; a grace timer only fires if
    /// the generation it captured is still current.
    generation: u64,
}

impl Seat {
    fn new(waiting: Waiting) -> Self {
        Self {
            participant: waiting.participant,
            token: waiting.token,
            name: waiting.name,
            outbox: Some(waiting.outbox),
            generation: 0,
        }
    }
}

#[derive(Debug)]
struct Session {
    id: MatchId,
    game: Match,
    seats: [Seat; 2],
    seq: u64,
}

impl Session {
    fn seat(&self, color: Color) -> &Seat {
        &self.seats[color.index()]
    }

    fn seat_mut(&mut self, color: Color) -> &mut Seat {
        &mut self.seats[color.index()]
    }

    fn color_of(&self, participant: ParticipantId) -> Option<Color> {
        Color::iter().find(|&c| self.seat(c).participant == participant)
    }

    fn players(&self) -> ColorPair<String> {
        ColorPair::from_fn(|c| self.seat(c).name.clone())
    }

    fn snapshot(&self) -> Snapshot {
        adapter::snapshot(self.id, self.seq, &self.players(), &self.game)
    }

    fn send(&self, color: Color, message: ServerMessage) {
        match &self.seat(color).outbox {
            Some(outbox) => deliver(outbox, message),
            None => debug!(match_id = %self.id, %color, "Seat disconnected, not sending"),
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        self.send(Color::White, message.clone());
        self.send(Color::Black, message);
    }

    /// Bumps the sequence number and pushes the new state to both seats.
    fn publish(&mut self) {
        self.seq += 1;
        let snapshot = self.snapshot();
        debug!(match_id = %self.id, seq = self.seq, "Publishing snapshot");
        self.broadcast(ServerMessage::State(snapshot));
    }

    /// Publishes the deciding snapshot, followed by `trailer` for one seat.
    /// Unlike [`Session::publish`], nothing is dropped on a full outbox.
    fn publish_final(&mut self, trailer: Option<(Color, ServerMessage)>) {
        self.seq += 1;
        let state = ServerMessage::State(self.snapshot());
        debug!(match_id = %self.id, seq = self.seq, "Publishing final snapshot");
        for color in Color::iter() {
            let Some(outbox) = &self.seat(color).outbox else {
                continue;
            };
            let mut messages = vec![state.clone()];
            if let Some((to, message)) = &trailer
                && *to == color
            {
                messages.push(message.clone());
            }
            deliver_all(outbox, messages);
        }
    }

    fn paired_message(&self, color: Color) -> ServerMessage {
        ServerMessage::Paired {
            participant_id: self.seat(color).participant,
            resume_token: self.seat(color).token.clone(),
            match_id: self.id,
            color,
            opponent: self.seat(color.opponent()).name.clone(),
        }
    }
}

#[derive(Debug, new)]
struct Waiting {
    participant: ParticipantId,
    token: ResumeToken,
    name: String,
    outbox: Outbox,
}

#[derive(Debug, Default)]
struct Registry {
    queue: VecDeque<Waiting>,
    sessions: HashMap<MatchId, Arc<Mutex<Session>>>,
    participants: HashMap<ParticipantId, MatchId>,
    next_participant: u64,
    next_match: u64,
}

impl Registry {
    fn allocate_participant(&mut self) -> ParticipantId {
        self.next_participant += 1;
        ParticipantId(self.next_participant)
    }

    fn allocate_match(&mut self) -> MatchId {
        self.next_match += 1;
        MatchId(self.next_match)
    }

    fn queue_position(&self, participant: ParticipantId) -> Option<usize> {
        self.queue.iter().position(|w| w.participant == participant)
    }

    fn is_active(&self, participant: ParticipantId) -> bool {
        self.queue_position(participant).is_some() || self.participants.contains_key(&participant)
    }

    fn session_of(&self, participant: ParticipantId) -> Option<Arc<Mutex<Session>>> {
        let match_id = self.participants.get(&participant)?;
        self.sessions.get(match_id).cloned()
    }
}

// ─────────────────────────────────────────────────────────────
//  Manager
// ─────────────────────────────────────────────────────────────

/// Pairs players and runs their matches.
#[derive(Debug, Clone)]
pub struct SessionManager {
    registry: Arc<Mutex<Registry>>,
    rng: Arc<Mutex<StdRng>>,
    config: Arc<ServerConfig>,
}

impl SessionManager {
    /// Creates a manager that rolls dice with `rng`.
    #[instrument(skip(rng))]
    pub fn new(config: ServerConfig, rng: StdRng) -> Self {
        info!("Creating session manager");
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            rng: Arc::new(Mutex::new(rng)),
            config: Arc::new(config),
        }
    }

    /// Creates a manager seeded from `dice_seed`, or from entropy.
    pub fn from_config(config: ServerConfig) -> Self {
        let rng = match config.dice_seed() {
            Some(seed) => {
                info!(seed, "Using fixed dice seed");
                StdRng::seed_from_u64(*seed)
            }
            None => StdRng::from_entropy(),
        };
        Self::new(config, rng)
    }

    /// The configuration this manager runs with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Number of players waiting for an opponent.
    pub fn queue_len(&self) -> usize {
        lock(&self.registry).queue.len()
    }

    /// Number of running matches.
    pub fn session_count(&self) -> usize {
        lock(&self.registry).sessions.len()
    }

    /// Routes one decoded client message.
    ///
    /// # Errors
    ///
    /// The refusal reason; nothing was changed and nobody was notified.
    #[instrument(skip(self, conn), fields(participant = ?conn.participant))]
    pub fn handle(&self, conn: &mut Connection, message: ClientMessage) -> Result<(), SessionError> {
        match message {
            ClientMessage::Enqueue { name } => self.enqueue(conn, name).map(|_| ()),
            ClientMessage::LeaveQueue => self.leave_queue(conn),
            ClientMessage::Resume {
                participant_id,
                resume_token,
            } => self.resume(conn, participant_id, &resume_token),
            ClientMessage::Roll => self.roll(conn),
            ClientMessage::Move { from, to, die } => self.apply_move(conn, from, to, die),
            ClientMessage::OfferDouble => self.offer_double(conn),
            ClientMessage::RespondDouble { accept } => self.respond_double(conn, accept),
            ClientMessage::Resign => self.resign(conn),
        }
    }

    // ─────────────────────────────────────────────────────────
    //  Queue
    // ─────────────────────────────────────────────────────────

    /// Queues the connection, or pairs it with the longest-waiting player.
    ///
    /// The waiter gets White. Replies `queued`, or sends `paired` and the
    /// opening snapshot to both players. Either way the reply carries a
    /// fresh resume token for this participant only.
    ///
    /// # Errors
    ///
    /// `AlreadyQueued` if this connection is already waiting or seated.
    #[instrument(skip(self, conn))]
    pub fn enqueue(&self, conn: &mut Connection, name: String) -> Result<ParticipantId, SessionError> {
        let token = ResumeToken::generate(&mut *lock(&self.rng));
        let mut registry = lock(&self.registry);
        if let Some(existing) = conn.participant
            && registry.is_active(existing)
        {
            warn!(participant = %existing, "Enqueue from an active participant");
            return Err(SessionError::AlreadyQueued(existing));
        }

        let participant = registry.allocate_participant();
        conn.participant = Some(participant);
        let arriving = Waiting::new(participant, token.clone(), name, conn.outbox.clone());

        let Some(waiting) = registry.queue.pop_front() else {
            registry.queue.push_back(arriving);
            let position = registry.queue.len();
            info!(%participant, position, "Queued");
            conn.send(ServerMessage::Queued {
                participant_id: participant,
                resume_token: token,
                position,
            });
            return Ok(participant);
        };

        let match_id = registry.allocate_match();
        let white = waiting.participant;
        let mut session = Session {
            id: match_id,
            game: Match::new(),
            seats: [Seat::new(waiting), Seat::new(arriving)],
            seq: 0,
        };
        info!(%match_id, %white, black = %participant, "Paired");

        // Announce before registering: no intent can reach the match until
        // both players have `paired` and the opening state queued.
        for color in Color::iter() {
            session.send(color, session.paired_message(color));
        }
        session.publish();

        registry.participants.insert(white, match_id);
        registry.participants.insert(participant, match_id);
        registry
            .sessions
            .insert(match_id, Arc::new(Mutex::new(session)));
        Ok(participant)
    }

    /// Takes the connection out of the queue.
    ///
    /// # Errors
    ///
    /// `NotQueued` if it is not waiting.
    #[instrument(skip(self, conn))]
    pub fn leave_queue(&self, conn: &Connection) -> Result<(), SessionError> {
        let participant = conn.participant.ok_or(SessionError::NotQueued)?;
        let mut registry = lock(&self.registry);
        let position = registry
            .queue_position(participant)
            .ok_or(SessionError::NotQueued)?;
        registry.queue.remove(position);
        drop(registry);

        info!(%participant, "Left queue");
        conn.send(ServerMessage::LeftQueue);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    //  Match intents
    // ─────────────────────────────────────────────────────────

    /// Rolls for the connection's side.
    ///
    /// # Errors
    ///
    /// `NoSuchMatch`, or the match's refusal.
    pub fn roll(&self, conn: &Connection) -> Result<(), SessionError> {
        self.run(conn, "roll", |session, color| {
            let mut rng = lock(&self.rng);
            Ok(session.game.roll(color, &mut *rng)?)
        })
    }

    /// Moves one checker, in wire coordinates.
    ///
    /// # Errors
    ///
    /// `NoSuchMatch`, a bad coordinate, or the match's refusal.
    pub fn apply_move(
        &self,
        conn: &Connection,
        from: i32,
        to: i32,
        die: Option<u8>,
    ) -> Result<(), SessionError> {
        self.run(conn, "move", |session, color| {
            let from = adapter::source_to_slot(color, from)?;
            let to = adapter::target_to_destination(to)?;
            Ok(session.game.apply_move(color, from, to, die)?)
        })
    }

    /// Offers the cube. Both players are told, then get the new state.
    ///
    /// # Errors
    ///
    /// `NoSuchMatch`, or the match's refusal.
    pub fn offer_double(&self, conn: &Connection) -> Result<(), SessionError> {
        self.run(conn, "offer_double", |session, color| {
            session.game.offer_double(color)?;
            session.broadcast(ServerMessage::DoubleOffered {
                by: color,
                cube: session.game.cube().value() * 2,
            });
            Ok(Progress::Continue)
        })
    }

    /// Takes or drops a pending double.
    ///
    /// # Errors
    ///
    /// `NoSuchMatch`, or the match's refusal.
    pub fn respond_double(&self, conn: &Connection, accept: bool) -> Result<(), SessionError> {
        self.run(conn, "respond_double", |session, color| {
            Ok(session.game.respond_double(color, accept)?)
        })
    }

    /// Concedes the match at the current cube.
    ///
    /// # Errors
    ///
    /// `NoSuchMatch` if there is no live match.
    pub fn resign(&self, conn: &Connection) -> Result<(), SessionError> {
        self.run(conn, "resign", |session, color| Ok(session.game.resign(color)?))
    }

    /// Applies `intent` under the session lock, publishes on success and
    /// tears the session down once the match is decided.
    fn run<F>(&self, conn: &Connection, intent: &'static str, apply: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut Session, Color) -> Result<Progress, SessionError>,
    {
        let participant = conn.participant.ok_or(SessionError::NoSuchMatch)?;
        let handle = lock(&self.registry)
            .session_of(participant)
            .ok_or(SessionError::NoSuchMatch)?;

        let mut session = lock(&handle);
        let color = session
            .color_of(participant)
            .ok_or(SessionError::NoSuchMatch)?;
        if session.game.is_finished() {
            return Err(SessionError::NoSuchMatch);
        }

        let progress = apply(&mut *session, color).inspect_err(|err| {
            warn!(match_id = %session.id, %participant, intent, error = %err, "Intent rejected");
        })?;
        debug!(match_id = %session.id, %participant, intent, ?progress, "Intent applied");

        if let Progress::Finished(outcome) = progress {
            session.publish_final(None);
            let match_id = session.id;
            info!(%match_id, %outcome, "Match complete");
            drop(session);
            self.remove_session(match_id);
        } else {
            session.publish();
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    //  Connection lifecycle
    // ─────────────────────────────────────────────────────────

    /// Handles a closed connection.
    ///
    /// A waiting player leaves the queue. A seated player's opponent is told
    /// and a grace timer starts; if both players are gone the match is
    /// removed at once. A connection that was already replaced by a resume
    /// is ignored.
    #[instrument(skip(self, conn), fields(participant = ?conn.participant))]
    pub fn disconnect(&self, conn: &Connection) {
        let Some(participant) = conn.participant else {
            return;
        };

        let handle = {
            let mut registry = lock(&self.registry);
            if let Some(position) = registry.queue_position(participant) {
                registry.queue.remove(position);
                info!(%participant, "Dropped from queue on disconnect");
                return;
            }
            match registry.session_of(participant) {
                Some(handle) => handle,
                None => return,
            }
        };

        let mut session = lock(&handle);
        let Some(color) = session.color_of(participant) else {
            return;
        };
        let seat = session.seat_mut(color);
        let current = seat
            .outbox
            .as_ref()
            .is_some_and(|outbox| outbox.same_channel(&conn.outbox));
        if !current {
            debug!(%participant, "Stale connection closed");
            return;
        }
        seat.outbox = None;
        seat.generation += 1;
        let generation = seat.generation;

        if session.seat(color.opponent()).outbox.is_none() {
            let match_id = session.id;
            info!(%match_id, "Both players gone, removing match");
            drop(session);
            self.remove_session(match_id);
            return;
        }

        let grace = self.config.grace_period();
        info!(match_id = %session.id, %participant, grace_secs = grace.as_secs(), "Player disconnected");
        session.send(
            color.opponent(),
            ServerMessage::OpponentDisconnected {
                grace_secs: grace.as_secs(),
            },
        );
        drop(session);

        let manager = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            manager.expire(participant, generation);
        });
    }

    /// Rebinds a seat to this connection, given the seat's resume token.
    ///
    /// Cancels the pending forfeit, tells the opponent, and re-sends
    /// `paired` plus the latest snapshot to the resumed player. A seat whose
    /// old connection is still open moves to the new one.
    ///
    /// # Errors
    ///
    /// `NoSuchMatch` if the participant has no live match or the token does
    /// not match; `AlreadyQueued` if this connection already plays as
    /// someone else.
    #[instrument(skip(self, conn, token))]
    pub fn resume(
        &self,
        conn: &mut Connection,
        participant: ParticipantId,
        token: &ResumeToken,
    ) -> Result<(), SessionError> {
        let handle = {
            let registry = lock(&self.registry);
            if let Some(existing) = conn.participant
                && existing != participant
                && registry.is_active(existing)
            {
                return Err(SessionError::AlreadyQueued(existing));
            }
            registry
                .session_of(participant)
                .ok_or(SessionError::NoSuchMatch)?
        };

        let mut session = lock(&handle);
        let color = session
            .color_of(participant)
            .ok_or(SessionError::NoSuchMatch)?;
        if session.seat(color).token != *token {
            warn!(match_id = %session.id, %participant, "Resume with wrong token");
            return Err(SessionError::NoSuchMatch);
        }
        if session.game.is_finished() {
            return Err(SessionError::NoSuchMatch);
        }

        let seat = session.seat_mut(color);
        let was_away = seat.outbox.is_none();
        seat.outbox = Some(conn.outbox.clone());
        seat.generation += 1;
        conn.participant = Some(participant);

        info!(match_id = %session.id, %participant, was_away, "Player resumed");
        session.send(color, session.paired_message(color));
        session.send(color, ServerMessage::State(session.snapshot()));
        if was_away {
            session.send(color.opponent(), ServerMessage::OpponentReconnected);
        }
        Ok(())
    }

    /// Grace timer callback: forfeits the seat unless it was resumed.
    #[instrument(skip(self))]
    fn expire(&self, participant: ParticipantId, generation: u64) {
        let Some(handle) = lock(&self.registry).session_of(participant) else {
            debug!("Match already gone");
            return;
        };

        let mut session = lock(&handle);
        let Some(color) = session.color_of(participant) else {
            return;
        };
        let seat = session.seat(color);
        if seat.outbox.is_some() || seat.generation != generation {
            debug!("Seat resumed, grace timer ignored");
            return;
        }

        if let Err(err) = session.game.forfeit(color) {
            debug!(error = %err, "Match already decided");
            return;
        }
        info!(match_id = %session.id, %participant, "Grace period expired, match forfeited");
        session.publish_final(Some((color.opponent(), ServerMessage::MatchAbandoned)));

        let match_id = session.id;
        drop(session);
        self.remove_session(match_id);
    }

    fn remove_session(&self, match_id: MatchId) {
        let mut registry = lock(&self.registry);
        registry.sessions.remove(&match_id);
        registry.participants.retain(|_, m| *m != match_id);
        debug!(%match_id, remaining = registry.sessions.len(), "Session removed");
    }
}
