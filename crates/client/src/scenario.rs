//! Scripted parlour session.
//!
//! Mara offers Jun a tattoo, Jun agrees, the plan takes Mara's needle and
//! stencil and a dab of ink, and the session runs its course. A second session
//! is cut short when Jun walks out. Tok is asked to hang a mirror it cannot
//! wield, and a last offer is simply ignored.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;

use accord_content::{LoadedWorld, TemplateRegistry};
use accord_core::{
    ActionInProgress, Decision, EffectContext, EntityId, HandlerError, InterruptReason,
    PlanInstance, PlanTemplate, ProgressHandler, ProgressInfo, ProposalHandler, ProposalInfo,
    ProposalRequest, RetainedResources,
};
use accord_runtime::{Event, RuntimeHandle};

const SESSION_TICKS: u64 = 30;
const IGNORED_OFFER_TICKS: u64 = 10;

/// Display names of spawned entities.
#[derive(Clone, Debug, Default)]
pub struct Names(BTreeMap<EntityId, String>);

impl Names {
    pub fn new(loaded: &LoadedWorld) -> Self {
        Self(
            loaded
                .names
                .iter()
                .map(|(name, id)| (*id, name.clone()))
                .collect(),
        )
    }

    pub fn of(&self, id: EntityId) -> String {
        self.0
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

/// Accept path: plan for `worker`, take the resources, start the session.
struct SessionOffer {
    template: Arc<PlanTemplate>,
    worker: EntityId,
    label: String,
    ticks: u64,
}

impl ProposalHandler for SessionOffer {
    fn on_accept(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        proposal: &ProposalInfo,
        _message: Option<&str>,
    ) -> Result<(), HandlerError> {
        let partner = if self.worker == proposal.proposer {
            proposal.target
        } else {
            proposal.proposer
        };

        let mut plan = PlanInstance::new(Arc::clone(&self.template), self.worker);
        let verdict = plan.check_feasibility(&*ctx.world);
        if !verdict.is_feasible() {
            ctx.notify(self.worker, format!("cannot start {}: {verdict}", self.label));
            ctx.notify(partner, format!("{} is off", self.label));
            return Ok(());
        }
        let retained = plan.execute_guarded(&mut *ctx.world)?.retain();

        let info = ProgressInfo::new(self.worker, self.label.as_str()).with_participant(partner);
        ctx.scheduler.attach(
            self.worker,
            ActionInProgress::new(
                info,
                Session {
                    partner,
                    retained,
                },
            ),
            Some(self.ticks),
        )?;
        ctx.notify(partner, format!("{} begins", self.label));
        Ok(())
    }

    fn on_decline(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        proposal: &ProposalInfo,
        message: Option<&str>,
    ) -> Result<(), HandlerError> {
        let reason = message.map(|m| format!(" ({m})")).unwrap_or_default();
        ctx.notify(proposal.proposer, format!("{} declined{reason}", self.label));
        Ok(())
    }

    fn on_expire(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        proposal: &ProposalInfo,
    ) -> Result<(), HandlerError> {
        ctx.notify(
            proposal.proposer,
            format!("nobody answered about {}", self.label),
        );
        Ok(())
    }
}

/// The timed part; hands the tools back however it ends.
struct Session {
    partner: EntityId,
    retained: RetainedResources,
}

impl ProgressHandler for Session {
    fn on_complete(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        action: &ProgressInfo,
    ) -> Result<(), HandlerError> {
        self.retained.release(&mut *ctx.world)?;
        ctx.notify(action.actor, format!("{} finished", action.description));
        ctx.notify(self.partner, format!("{} finished", action.description));
        Ok(())
    }

    fn on_interrupted(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        action: &ProgressInfo,
        reason: InterruptReason,
    ) -> Result<(), HandlerError> {
        self.retained.release(&mut *ctx.world)?;
        let why = match reason {
            InterruptReason::Cancelled => "cancelled".to_string(),
            InterruptReason::Interrupted(flags) => format!("interrupted by {flags:?}"),
        };
        ctx.notify(action.actor, format!("{} {why}", action.description));
        Ok(())
    }
}

struct Cast {
    mara: EntityId,
    jun: EntityId,
    tok: EntityId,
    parlour: EntityId,
    street: EntityId,
    ink: EntityId,
}

impl Cast {
    fn new(loaded: &LoadedWorld) -> Result<Self> {
        Ok(Self {
            mara: loaded.require("Mara")?,
            jun: loaded.require("Jun")?,
            tok: loaded.require("Tok")?,
            parlour: loaded.require("parlour")?,
            street: loaded.require("street")?,
            ink: loaded.require("ink")?,
        })
    }
}

/// Plays the whole session against a running runtime.
pub async fn run(
    handle: &RuntimeHandle,
    loaded: &LoadedWorld,
    templates: &TemplateRegistry,
) -> Result<()> {
    let cast = Cast::new(loaded)?;
    let tattoo = templates.require("tattoo")?;
    let mirror = templates.require("hang-mirror")?;

    // A full session.
    let offer = SessionOffer {
        template: Arc::clone(&tattoo),
        worker: cast.mara,
        label: "tattoo".into(),
        ticks: SESSION_TICKS,
    };
    handle
        .propose(
            ProposalRequest::new(cast.mara, cast.jun, "a small swallow on the wrist")
                .keywords(["tattoo", "inscribe"]),
            offer,
        )
        .await?;
    for summary in handle.pending(cast.jun).await? {
        println!("Jun is asked: {summary}");
    }
    handle
        .resolve(cast.jun, "", Decision::Accept, Some("go ahead"))
        .await?;
    handle.advance(SESSION_TICKS).await?;

    // Cut short by the client leaving.
    let offer = SessionOffer {
        template: Arc::clone(&tattoo),
        worker: cast.mara,
        label: "touch-up".into(),
        ticks: SESSION_TICKS,
    };
    handle
        .propose(
            ProposalRequest::new(cast.mara, cast.jun, "a touch-up of the swallow")
                .keywords(["touch-up"]),
            offer,
        )
        .await?;
    handle.resolve(cast.jun, "touch", Decision::Accept, None).await?;
    handle.advance(SESSION_TICKS / 2).await?;
    handle.move_actor(cast.jun, Some(cast.street)).await?;
    handle.move_actor(cast.jun, Some(cast.parlour)).await?;

    // Tok has one hand; the mirror needs two.
    let offer = SessionOffer {
        template: Arc::clone(&mirror),
        worker: cast.tok,
        label: "mirror hanging".into(),
        ticks: SESSION_TICKS,
    };
    handle
        .propose(
            ProposalRequest::new(cast.mara, cast.tok, "hang the big mirror")
                .keywords(["mirror", "hang"]),
            offer,
        )
        .await?;
    handle
        .resolve(cast.tok, "mirror", Decision::Accept, None)
        .await?;

    // Nobody answers.
    let offer = SessionOffer {
        template: mirror,
        worker: cast.tok,
        label: "second try".into(),
        ticks: SESSION_TICKS,
    };
    handle
        .propose(
            ProposalRequest::new(cast.mara, cast.tok, "try the mirror again")
                .keywords(["again"])
                .duration(IGNORED_OFFER_TICKS),
            offer,
        )
        .await?;
    handle.advance(IGNORED_OFFER_TICKS).await?;

    let world = handle.inspect().await?;
    let ink_left = world.item_state(cast.ink).map_or(0, |ink| ink.quantity);
    println!("Ink left in the pot: {ink_left}");
    println!("Clock: {}", handle.now().await?);
    Ok(())
}

/// Prints notices as they arrive until the runtime goes away.
pub async fn print_notices(mut rx: broadcast::Receiver<Event>, names: Names) {
    loop {
        match rx.recv().await {
            Ok(Event::Notice(notice)) => {
                println!(
                    "[{}] {}: {}",
                    notice.clock,
                    names.of(notice.recipient),
                    notice.text
                );
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "notice printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Logs every event as a JSON line at debug level.
pub async fn log_events(mut rx: broadcast::Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(event) => match event.to_json() {
                Ok(json) => tracing::debug!(target: "accord::events", "{json}"),
                Err(e) => tracing::warn!("event not serializable: {e}"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
