//! Runtime tests: commands go through the simulation worker, outcomes come
//! back on the event bus.

use std::time::Duration;

use accord_core::{
    ActionInProgress, Body, Decision, EffectContext, EffectEvent, EntityId, HandlerError,
    InterruptFlags, InterruptReason, ProgressHandler, ProgressInfo, ProposalError,
    ProposalHandler, ProposalInfo, ProposalRequest, ProposalState, SchedulerError, WorldState,
};
use accord_runtime::{Event, ProposalEvent, Runtime, RuntimeError, Topic};
use tokio::sync::broadcast;
use tokio::time::timeout;

struct Greeting;

impl ProposalHandler for Greeting {
    fn on_accept(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        proposal: &ProposalInfo,
        message: Option<&str>,
    ) -> Result<(), HandlerError> {
        ctx.notify(proposal.proposer, format!("accepted: {}", message.unwrap_or("")));
        Ok(())
    }

    fn on_decline(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        proposal: &ProposalInfo,
        _message: Option<&str>,
    ) -> Result<(), HandlerError> {
        ctx.notify(proposal.proposer, "declined");
        Ok(())
    }

    fn on_expire(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        proposal: &ProposalInfo,
    ) -> Result<(), HandlerError> {
        ctx.notify(proposal.proposer, "expired");
        Ok(())
    }
}

struct Sketch;

impl ProgressHandler for Sketch {
    fn on_complete(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        action: &ProgressInfo,
    ) -> Result<(), HandlerError> {
        ctx.notify(action.actor, "sketch done");
        Ok(())
    }

    fn on_interrupted(
        self: Box<Self>,
        ctx: &mut EffectContext<'_>,
        action: &ProgressInfo,
        _reason: InterruptReason,
    ) -> Result<(), HandlerError> {
        ctx.notify(action.actor, "sketch ruined");
        Ok(())
    }
}

struct Parlour {
    world: WorldState,
    street: EntityId,
    artist: EntityId,
    client: EntityId,
}

fn parlour() -> Parlour {
    let mut world = WorldState::new();
    let parlour = world.spawn_location("parlour");
    let street = world.spawn_location("street");
    let artist = world.spawn_actor("artist", Body::humanoid(), Some(parlour));
    let client = world.spawn_actor("client", Body::humanoid(), Some(parlour));
    Parlour {
        world,
        street,
        artist,
        client,
    }
}

async fn next_event(rx: &mut broadcast::Receiver<Event>) -> Event {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event bus closed")
}

fn tattoo(artist: EntityId, client: EntityId) -> ProposalRequest {
    ProposalRequest::new(artist, client, "a tattoo").keywords(["tattoo", "inscribe"])
}

#[tokio::test]
async fn accept_flows_through_event_topics() {
    let Parlour {
        world,
        artist,
        client,
        ..
    } = parlour();
    let runtime = Runtime::builder().world(world).build().await.unwrap();
    let handle = runtime.handle();
    let mut proposals = handle.subscribe(Topic::Proposal);
    let mut notices = handle.subscribe(Topic::Notice);

    let id = handle.propose(tattoo(artist, client), Greeting).await.unwrap();
    match next_event(&mut proposals).await {
        Event::Proposal(ProposalEvent::Raised(summary)) => {
            assert_eq!(summary.effect, id);
            assert_eq!(summary.info.target, client);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(handle.pending(client).await.unwrap().len(), 1);

    let outcome = handle
        .resolve(client, "", Decision::Accept, Some("go ahead"))
        .await
        .unwrap();
    assert_eq!(outcome.state, ProposalState::Accepted);

    match next_event(&mut proposals).await {
        Event::Proposal(ProposalEvent::Resolved { effect, state, .. }) => {
            assert_eq!(effect, id);
            assert_eq!(state, ProposalState::Accepted);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match next_event(&mut notices).await {
        Event::Notice(notice) => {
            assert_eq!(notice.recipient, artist);
            assert_eq!(notice.text, "accepted: go ahead");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let err = handle
        .resolve(client, "", Decision::Accept, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Proposal(ProposalError::NoProposal { .. })
    ));

    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn manual_advance_expires_proposal() {
    let Parlour {
        world,
        artist,
        client,
        ..
    } = parlour();
    let runtime = Runtime::builder().world(world).build().await.unwrap();
    let handle = runtime.handle();
    let mut notices = handle.subscribe(Topic::Notice);

    handle
        .propose(tattoo(artist, client).duration(5), Greeting)
        .await
        .unwrap();
    assert_eq!(handle.advance(4).await.unwrap(), 0);
    assert_eq!(handle.advance(1).await.unwrap(), 1);
    assert!(handle.pending(client).await.unwrap().is_empty());

    match next_event(&mut notices).await {
        Event::Notice(notice) => assert_eq!(notice.text, "expired"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn clock_drives_expiry() {
    let Parlour {
        world,
        artist,
        client,
        ..
    } = parlour();
    let runtime = Runtime::builder()
        .world(world)
        .tick_interval(Duration::from_millis(5))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let mut proposals = handle.subscribe(Topic::Proposal);

    let id = handle
        .propose(tattoo(artist, client).duration(3), Greeting)
        .await
        .unwrap();

    loop {
        if let Event::Proposal(ProposalEvent::Resolved { effect, state, .. }) =
            next_event(&mut proposals).await
        {
            assert_eq!(effect, id);
            assert_eq!(state, ProposalState::Expired);
            break;
        }
    }
    assert!(handle.now().await.unwrap().0 >= 3);

    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn moving_participant_interrupts_action() {
    let Parlour {
        world,
        street,
        artist,
        client,
    } = parlour();
    let runtime = Runtime::builder().world(world).build().await.unwrap();
    let handle = runtime.handle();
    let mut effects = handle.subscribe(Topic::Effect);
    let mut notices = handle.subscribe(Topic::Notice);

    handle
        .with_realm(move |realm| {
            let info = ProgressInfo::new(artist, "sketching").with_participant(client);
            realm.attach(artist, ActionInProgress::new(info, Sketch), Some(100))
        })
        .await
        .unwrap()
        .unwrap();
    assert!(handle.with_realm(move |realm| realm.is_busy(artist)).await.unwrap());

    assert_eq!(handle.move_actor(client, Some(street)).await.unwrap(), 1);

    let mut interrupted = false;
    while !interrupted {
        if let Event::Effect(update) = next_event(&mut effects).await {
            interrupted = matches!(
                update.event,
                EffectEvent::Interrupted { owner, flags, .. }
                    if owner == artist && flags.contains(InterruptFlags::MOVEMENT)
            );
        }
    }
    match next_event(&mut notices).await {
        Event::Notice(notice) => assert_eq!(notice.text, "sketch ruined"),
        other => panic!("unexpected event: {other:?}"),
    }

    let world = handle.inspect().await.unwrap();
    assert_eq!(world.actor(client).unwrap().location, Some(street));
}

#[tokio::test]
async fn destroyed_entity_rejects_new_work() {
    let Parlour {
        world,
        artist,
        client,
        ..
    } = parlour();
    let runtime = Runtime::builder().world(world).build().await.unwrap();
    let handle = runtime.handle();

    handle.propose(tattoo(artist, client), Greeting).await.unwrap();
    assert!(handle.destroy(artist).await.unwrap());
    assert!(handle.pending(client).await.unwrap().is_empty());
    assert!(!handle.destroy(artist).await.unwrap());

    let err = handle
        .propose(tattoo(client, artist), Greeting)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Proposal(ProposalError::Scheduler(SchedulerError::UnknownOwner(id)))
            if id == artist
    ));
}
