use emitter_core::db::open_db_in_memory;
use emitter_core::{
    DisabledNotifier, EditOutcome, FixtureMessageRepository, MessageFilter, MessageId,
    MessageRepository, MessageService, MessageSummary, NewMessage, Notifier, NotifyError,
    RepoError, SqliteMessageRepository,
};
use std::cell::RefCell;

#[derive(Default)]
struct RecordingNotifier {
    bodies: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, body: &str) -> Result<(), NotifyError> {
        self.bodies.borrow_mut().push(body.to_string());
        Ok(())
    }
}

struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::InvalidEndpoint {
            endpoint: "unreachable".to_string(),
            reason: "test".to_string(),
        })
    }
}

fn fixture_service() -> MessageService<FixtureMessageRepository, DisabledNotifier> {
    MessageService::new(FixtureMessageRepository::with_fixtures(), DisabledNotifier)
}

fn empty_service() -> MessageService<FixtureMessageRepository, DisabledNotifier> {
    MessageService::new(FixtureMessageRepository::empty(), DisabledNotifier)
}

fn assert_counts_add_up<R: MessageRepository, N: Notifier>(service: &MessageService<R, N>) {
    assert_eq!(
        service.remaining_count().unwrap() + service.sent_count().unwrap(),
        service.total_count().unwrap()
    );
}

#[test]
fn fixture_collection_derives_expected_values() {
    let service = fixture_service();

    assert_eq!(service.remaining_count().unwrap(), 2);
    assert_eq!(service.sent_count().unwrap(), 1);
    assert_eq!(service.pluralize_label().unwrap(), "messages");
    assert!(service.has_sent().unwrap());
    assert!(!service.all_are_done().unwrap());
    assert_eq!(
        service.summary().unwrap(),
        MessageSummary {
            total: 3,
            remaining: 2,
            sent: 1,
            has_sent: true,
            all_done: false,
            label: "messages",
        }
    );
}

#[test]
fn blank_create_is_a_no_op() {
    let service = fixture_service();

    assert!(service.create_message("").unwrap().is_none());
    assert!(service.create_message("   ").unwrap().is_none());
    assert!(service.create_message("\t\n").unwrap().is_none());
    assert_eq!(service.total_count().unwrap(), 3);
}

#[test]
fn create_adds_one_unsent_message_with_body_as_given() {
    let service = fixture_service();

    let created = service.create_message("abc").unwrap().unwrap();
    assert!(!created.is_sent);
    assert_eq!(service.total_count().unwrap(), 4);

    let padded = service.create_message("  spaced  ").unwrap().unwrap();
    assert_eq!(padded.body, "  spaced  ");
    assert_counts_add_up(&service);
}

#[test]
fn staging_field_is_cleared_only_on_success() {
    let service = empty_service();

    let mut draft = "   ".to_string();
    assert!(service.create_from_draft(&mut draft).unwrap().is_none());
    assert_eq!(draft, "   ");

    let mut draft = "hello".to_string();
    let created = service.create_from_draft(&mut draft).unwrap().unwrap();
    assert_eq!(created.body, "hello");
    assert!(draft.is_empty());
}

#[test]
fn derived_values_follow_every_mutation() {
    let service = empty_service();
    assert_eq!(service.pluralize_label().unwrap(), "messages");
    assert!(!service.all_are_done().unwrap());

    let mut first = service.create_message("one").unwrap().unwrap();
    assert_eq!(service.remaining_count().unwrap(), 1);
    assert_eq!(service.pluralize_label().unwrap(), "message");

    service.create_message("two").unwrap();
    assert_eq!(service.pluralize_label().unwrap(), "messages");

    service.set_sent(&mut first, true).unwrap();
    assert_eq!(service.remaining_count().unwrap(), 1);
    assert_eq!(service.pluralize_label().unwrap(), "message");
    assert!(service.has_sent().unwrap());
    assert_counts_add_up(&service);
}

#[test]
fn all_are_done_is_false_for_empty_collection() {
    assert!(!empty_service().all_are_done().unwrap());
}

#[test]
fn set_all_done_toggles_every_member() {
    let service = fixture_service();

    assert_eq!(service.set_all_done(true).unwrap(), 2);
    assert!(service.all_are_done().unwrap());
    assert_eq!(service.remaining_count().unwrap(), 0);

    assert_eq!(service.set_all_done(false).unwrap(), 3);
    assert!(!service.all_are_done().unwrap());
    assert_eq!(service.sent_count().unwrap(), 0);
    assert!(!service.has_sent().unwrap());
}

#[test]
fn clear_sent_removes_exactly_the_sent_members() {
    let service = fixture_service();
    let mut extra = service.create_message("extra").unwrap().unwrap();
    service.set_sent(&mut extra, true).unwrap();

    assert_eq!(service.clear_sent().unwrap(), 2);

    let remaining: Vec<MessageId> = service
        .list_messages(MessageFilter::All)
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(remaining, vec![MessageId(2), MessageId(3)]);
    assert!(!service.has_sent().unwrap());
    assert_eq!(service.clear_sent().unwrap(), 0);
}

#[test]
fn clear_sent_works_from_a_snapshot_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMessageRepository::try_new(&conn).unwrap();
    for draft in emitter_core::fixture_messages() {
        repo.create_message(&draft).unwrap();
    }
    repo.create_message(&NewMessage {
        body: "second sent".to_string(),
        is_sent: true,
    })
    .unwrap();
    let service = MessageService::new(repo, DisabledNotifier);

    assert_eq!(service.clear_sent().unwrap(), 2);
    assert_eq!(service.total_count().unwrap(), 2);
    assert_eq!(service.sent_count().unwrap(), 0);
}

#[test]
fn set_sent_persists_and_returns_value() {
    let service = fixture_service();
    let mut message = service.require_message(MessageId(2)).unwrap();

    assert!(!service.is_sent(&message));
    assert!(service.set_sent(&mut message, true).unwrap());
    assert!(service.is_sent(&message));
    assert!(service.require_message(MessageId(2)).unwrap().is_sent);
}

#[test]
fn edit_with_blank_body_deletes_the_message() {
    let service = fixture_service();
    let mut message = service.require_message(MessageId(1)).unwrap();

    let outcome = service.edit_body(&mut message, "").unwrap();
    assert_eq!(outcome, EditOutcome::Deleted(MessageId(1)));
    assert_eq!(service.total_count().unwrap(), 2);
    assert!(service.get_message(MessageId(1)).unwrap().is_none());

    let mut other = service.require_message(MessageId(2)).unwrap();
    let outcome = service.edit_body(&mut other, "   ").unwrap();
    assert_eq!(outcome, EditOutcome::Deleted(MessageId(2)));
    assert_eq!(service.total_count().unwrap(), 1);
}

#[test]
fn edit_with_text_saves_body_as_given() {
    let service = fixture_service();
    let mut message = service.require_message(MessageId(3)).unwrap();

    let outcome = service.edit_body(&mut message, " updated ").unwrap();
    match outcome {
        EditOutcome::Saved(saved) => assert_eq!(saved.body, " updated "),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        service.require_message(MessageId(3)).unwrap().body,
        " updated "
    );
}

#[test]
fn edit_session_persists_only_on_accept() {
    let service = fixture_service();

    let mut session = service.begin_edit(service.require_message(MessageId(2)).unwrap());
    assert_eq!(session.draft(), "...");
    session.set_draft("discarded");
    let untouched = session.cancel();
    assert_eq!(untouched.body, "...");
    assert_eq!(service.require_message(MessageId(2)).unwrap().body, "...");

    let mut session = service.begin_edit(untouched);
    session.set_draft("kept");
    assert!(matches!(
        service.accept_edit(session).unwrap(),
        EditOutcome::Saved(_)
    ));
    assert_eq!(service.require_message(MessageId(2)).unwrap().body, "kept");

    let mut session = service.begin_edit(service.require_message(MessageId(2)).unwrap());
    session.set_draft("");
    assert_eq!(
        service.accept_edit(session).unwrap(),
        EditOutcome::Deleted(MessageId(2))
    );
}

#[test]
fn delete_message_marks_then_removes() {
    let service = fixture_service();
    let mut message = service.require_message(MessageId(3)).unwrap();

    service.delete_message(&mut message).unwrap();
    assert!(message.is_marked_for_deletion());
    assert!(service.get_message(MessageId(3)).unwrap().is_none());
    assert_counts_add_up(&service);
}

#[test]
fn notify_sent_posts_body_once_and_marks_sent() {
    let notifier = RecordingNotifier::default();
    let service = MessageService::new(FixtureMessageRepository::with_fixtures(), &notifier);
    let mut message = service.require_message(MessageId(3)).unwrap();

    service.notify_sent(&mut message).unwrap();

    assert!(message.is_sent);
    assert!(service.require_message(MessageId(3)).unwrap().is_sent);
    assert_eq!(*notifier.bodies.borrow(), vec!["testing 1, 2, 3".to_string()]);
}

#[test]
fn notify_failure_still_marks_sent() {
    let service = MessageService::new(FixtureMessageRepository::with_fixtures(), FailingNotifier);
    let mut message = service.require_message(MessageId(2)).unwrap();

    service.notify_sent(&mut message).unwrap();
    assert!(service.require_message(MessageId(2)).unwrap().is_sent);
}

#[test]
fn reset_sent_clears_flag_without_notifying() {
    let notifier = RecordingNotifier::default();
    let service = MessageService::new(FixtureMessageRepository::with_fixtures(), &notifier);
    let mut message = service.require_message(MessageId(1)).unwrap();

    service.reset_sent(&mut message).unwrap();

    assert!(!service.require_message(MessageId(1)).unwrap().is_sent);
    assert!(notifier.bodies.borrow().is_empty());
    assert_eq!(service.remaining_count().unwrap(), 3);
}

#[test]
fn require_message_reports_missing_id() {
    let service = fixture_service();
    assert!(matches!(
        service.require_message(MessageId(42)).unwrap_err(),
        RepoError::NotFound(MessageId(42))
    ));
}

#[test]
fn views_partition_the_collection() {
    let service = fixture_service();
    let active = service.list_messages(MessageFilter::Unsent).unwrap();
    let completed = service.list_messages(MessageFilter::Sent).unwrap();

    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|m| !m.is_sent));
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].body, "Hola");
}
