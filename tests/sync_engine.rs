//! Integration tests for the sync engine
//!
//! These tests drive the full engine through the in-memory store's events,
//! with recording fakes for Jira, prompts, notifications and persistence.
//! Tokio time is paused so timers and throttle windows are deterministic.

use async_trait::async_trait;
use jirasync::config::{IntegrationConfig, TransitionPolicy};
use jirasync::integrations::{ImportCandidates, IssueGateway};
use jirasync::model::{
    IssueCache, IssueType, LocalState, RemoteIssue, Task, TaskChanges, TaskId, TaskState,
};
use jirasync::storage::IssuePersistence;
use jirasync::store::{MemoryStore, StateSnapshot};
use jirasync::sync::{Collaborators, EngineConfig, SyncEngine, SyncEvent};
use jirasync::ui::{Notification, Notifier, Prompter, Severity};
use jirasync::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum GatewayCall {
    Refresh {
        issue_id: String,
        force: bool,
        dialog: bool,
    },
    UpdateAssignee {
        issue_id: String,
        user_name: String,
    },
    Transition {
        issue_id: String,
        transition_id: String,
    },
    FindCandidates,
    LoadMissing(String),
}

#[derive(Default)]
struct FakeGateway {
    calls: Mutex<Vec<GatewayCall>>,
    candidates: Mutex<Option<ImportCandidates>>,
}

impl FakeGateway {
    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn set_candidates(&self, candidates: ImportCandidates) {
        *self.candidates.lock().unwrap() = Some(candidates);
    }

    fn refreshes(&self) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, GatewayCall::Refresh { .. }))
            .collect()
    }

    fn writes(&self) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    GatewayCall::UpdateAssignee { .. } | GatewayCall::Transition { .. }
                )
            })
            .collect()
    }
}

#[async_trait]
impl IssueGateway for FakeGateway {
    async fn refresh_issue(
        &self,
        issue_id: &str,
        _current: Option<&RemoteIssue>,
        force_update: bool,
        show_dialog_on_diff: bool,
    ) -> Result<()> {
        self.record(GatewayCall::Refresh {
            issue_id: issue_id.to_string(),
            force: force_update,
            dialog: show_dialog_on_diff,
        });
        Ok(())
    }

    async fn update_assignee(&self, issue_id: &str, user_name: &str) -> Result<()> {
        self.record(GatewayCall::UpdateAssignee {
            issue_id: issue_id.to_string(),
            user_name: user_name.to_string(),
        });
        Ok(())
    }

    async fn transition_issue(&self, issue_id: &str, transition_id: &str) -> Result<()> {
        self.record(GatewayCall::Transition {
            issue_id: issue_id.to_string(),
            transition_id: transition_id.to_string(),
        });
        Ok(())
    }

    async fn find_auto_import_candidates(&self) -> Result<ImportCandidates> {
        self.record(GatewayCall::FindCandidates);
        Ok(self
            .candidates
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(ImportCandidates::Issues(vec![])))
    }

    async fn load_missing_issue(&self, issue_id: &str) -> Result<()> {
        self.record(GatewayCall::LoadMissing(issue_id.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Prompt {
    Confirm(String),
    Transition { issue_id: String, state: LocalState },
    Worklog { issue_id: String, task_id: String },
}

#[derive(Default)]
struct FakePrompter {
    prompts: Mutex<Vec<Prompt>>,
    confirm: AtomicBool,
}

impl FakePrompter {
    fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    fn confirms(&self) -> usize {
        self.prompts()
            .iter()
            .filter(|p| matches!(p, Prompt::Confirm(_)))
            .count()
    }
}

#[async_trait]
impl Prompter for FakePrompter {
    async fn open_confirm(&self, message: &str, _ok_label: &str) -> Result<bool> {
        self.prompts
            .lock()
            .unwrap()
            .push(Prompt::Confirm(message.to_string()));
        Ok(self.confirm.load(Ordering::SeqCst))
    }

    async fn open_transition(&self, issue: &RemoteIssue, local_state: LocalState) -> Result<()> {
        self.prompts.lock().unwrap().push(Prompt::Transition {
            issue_id: issue.id.clone(),
            state: local_state,
        });
        Ok(())
    }

    async fn open_worklog(&self, issue: &RemoteIssue, task: &Task) -> Result<()> {
        self.prompts.lock().unwrap().push(Prompt::Worklog {
            issue_id: issue.id.clone(),
            task_id: task.id.to_string(),
        });
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn all(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
struct RecordingPersistence {
    saves: Mutex<Vec<(String, usize)>>,
    last_active: AtomicUsize,
}

impl RecordingPersistence {
    fn saves(&self) -> Vec<(String, usize)> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssuePersistence for RecordingPersistence {
    async fn save_issues_for_project(
        &self,
        project_id: &str,
        _issue_type: IssueType,
        issues: &IssueCache,
    ) -> Result<()> {
        self.saves
            .lock()
            .unwrap()
            .push((project_id.to_string(), issues.len()));
        Ok(())
    }

    async fn save_last_active(&self) -> Result<()> {
        self.last_active.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_issues_for_project(
        &self,
        _project_id: &str,
        _issue_type: IssueType,
    ) -> Result<IssueCache> {
        Ok(IssueCache::new())
    }
}

/// A started engine wired to fakes
struct Harness {
    store: Arc<MemoryStore>,
    gateway: Arc<FakeGateway>,
    prompter: Arc<FakePrompter>,
    notifier: Arc<RecordingNotifier>,
    persistence: Arc<RecordingPersistence>,
    engine: SyncEngine,
}

impl Harness {
    fn start() -> Self {
        let engine_config = EngineConfig::default();
        let bus = engine_config.event_bus();
        let store = Arc::new(MemoryStore::new(bus.clone()));
        let gateway = Arc::new(FakeGateway::default());
        let prompter = Arc::new(FakePrompter::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let persistence = Arc::new(RecordingPersistence::default());

        let collab = Collaborators {
            state: store.clone(),
            tasks: store.clone(),
            gateway: gateway.clone(),
            persistence: persistence.clone(),
            prompter: prompter.clone(),
            notifier: notifier.clone(),
        };
        let mut engine = SyncEngine::new(engine_config, collab, bus);
        engine.start();

        Self {
            store,
            gateway,
            prompter,
            notifier,
            persistence,
            engine,
        }
    }

    fn load(&self, config: IntegrationConfig, issues: Vec<RemoteIssue>, tasks: Vec<Task>) {
        self.store.load_project(
            "work",
            config,
            IssueCache::from_issues(issues),
            TaskState::from_tasks(tasks),
        );
    }

    fn messages(&self) -> Vec<String> {
        self.notifier.all().into_iter().map(|n| n.message).collect()
    }
}

/// Let every component process what is pending
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

fn linked(id: &str, issue_id: &str) -> Task {
    Task::new(id, format!("Task {}", id)).with_issue(IssueType::Jira, issue_id)
}

fn issue(id: &str, key: &str) -> RemoteIssue {
    RemoteIssue::new(id, key, format!("Summary {}", key))
}

mod disabled_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_disabled_config_never_fires() {
        let h = Harness::start();
        let mut config = IntegrationConfig {
            is_enabled: false,
            is_auto_poll_tickets: true,
            is_auto_add_to_backlog: true,
            is_worklog_enabled: true,
            is_check_to_re_assign_ticket_on_task_start: true,
            is_transition_issues_enabled: true,
            user_name: "jdoe".into(),
            ..Default::default()
        };
        config
            .transition_config
            .set(LocalState::Done, Some(TransitionPolicy::fixed("31", "Done")));
        h.gateway
            .set_candidates(ImportCandidates::Issues(vec![issue("9", "X-9")]));

        h.load(
            config,
            vec![issue("1", "X-1").with_assignee("bob", "Bob")],
            vec![linked("a", "1"), linked("b", "404")],
        );
        settle().await;

        h.store.set_current_task(Some(TaskId::new("a")));
        h.store
            .update_task(&TaskId::new("a"), TaskChanges::mark_done())
            .unwrap();
        h.engine.bus().send_event(SyncEvent::BacklogImportRequested);
        tokio::time::sleep(Duration::from_secs(15 * 60)).await;

        assert!(h.gateway.calls().is_empty());
        assert!(h.prompter.prompts().is_empty());
        assert!(h.notifier.all().is_empty());
    }
}

mod polling_tests {
    use super::*;

    fn polling_config() -> IntegrationConfig {
        IntegrationConfig {
            is_auto_poll_tickets: true,
            ..IntegrationConfig::enabled("jdoe")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_poll_after_initial_delay_then_interval() {
        let h = Harness::start();
        h.load(
            polling_config(),
            vec![issue("1", "X-1"), issue("2", "X-2")],
            vec![linked("a", "1"), linked("b", "2")],
        );
        settle().await;

        tokio::time::sleep(Duration::from_secs(7)).await;
        assert!(h.gateway.refreshes().is_empty());

        tokio::time::sleep(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(
            h.gateway.refreshes(),
            vec![
                GatewayCall::Refresh {
                    issue_id: "1".into(),
                    force: true,
                    dialog: false
                },
                GatewayCall::Refresh {
                    issue_id: "2".into(),
                    force: true,
                    dialog: false
                },
            ]
        );
        let poll_notice = h.notifier.all().into_iter().next().unwrap();
        assert_eq!(poll_notice.message, "Jira: Polling Changes for 2 issues");
        assert!(poll_notice.subtle);

        tokio::time::sleep(Duration::from_secs(5 * 60)).await;
        settle().await;
        assert_eq!(h.gateway.refreshes().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_poll_notification_without_issues() {
        let h = Harness::start();
        h.load(polling_config(), vec![], vec![]);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(h.gateway.calls().is_empty());
        assert!(h.notifier.all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_polling_stops_ticks() {
        let h = Harness::start();
        h.load(polling_config(), vec![issue("1", "X-1")], vec![linked("a", "1")]);
        settle().await;

        h.store.set_config(IntegrationConfig::enabled("jdoe"));
        tokio::time::sleep(Duration::from_secs(30 * 60)).await;
        assert!(h.gateway.refreshes().is_empty());

        h.store.set_config(polling_config());
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(h.gateway.refreshes().len(), 1);
    }
}

mod backlog_tests {
    use super::*;

    fn backlog_config() -> IntegrationConfig {
        IntegrationConfig {
            is_auto_add_to_backlog: true,
            ..IntegrationConfig::enabled("jdoe")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_imports_only_new_issue_with_singular_message() {
        let h = Harness::start();
        h.gateway.set_candidates(ImportCandidates::Issues(vec![
            issue("1", "X-1"),
            issue("2", "X-2"),
        ]));
        h.load(backlog_config(), vec![issue("1", "X-1")], vec![linked("a", "1")]);
        settle().await;

        tokio::time::sleep(Duration::from_secs(12)).await;
        settle().await;

        let snapshot = h.store.snapshot();
        assert_eq!(snapshot.tasks.issue_ids(IssueType::Jira), vec!["1", "2"]);
        let head = snapshot.tasks.backlog_ids.first().unwrap();
        assert_eq!(snapshot.task(head).unwrap().title, "X-2 Summary X-2");

        let imported: Vec<_> = h
            .notifier
            .all()
            .into_iter()
            .filter(|n| n.icon.as_deref() == Some("cloud_download"))
            .collect();
        assert_eq!(imported.len(), 1);
        assert_eq!(
            imported[0].message,
            "Jira: Imported issue \"X-2 Summary X-2\" from Jira to backlog"
        );

        // the next pass finds nothing new
        tokio::time::sleep(Duration::from_secs(5 * 60)).await;
        settle().await;
        assert_eq!(h.store.snapshot().tasks.issue_ids(IssueType::Jira).len(), 2);
        assert_eq!(h.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_never_duplicates_regardless_of_order() {
        let h = Harness::start();
        h.gateway.set_candidates(ImportCandidates::Issues(vec![
            issue("3", "X-3"),
            issue("1", "X-1"),
            issue("3", "X-3"),
            issue("2", "X-2"),
        ]));
        h.load(
            IntegrationConfig::enabled("jdoe"),
            vec![issue("2", "X-2")],
            vec![linked("a", "2")],
        );
        settle().await;

        h.engine.bus().send_event(SyncEvent::BacklogImportRequested);
        settle().await;

        let mut ids = h.store.snapshot().tasks.issue_ids(IssueType::Jira);
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(
            h.messages(),
            vec!["Jira: Imported 2 new issues from Jira to backlog".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_candidates_abort_silently() {
        let h = Harness::start();
        h.gateway.set_candidates(ImportCandidates::Malformed);
        h.load(IntegrationConfig::enabled("jdoe"), vec![], vec![]);
        settle().await;

        h.engine.bus().send_event(SyncEvent::BacklogImportRequested);
        settle().await;

        assert_eq!(h.gateway.calls(), vec![GatewayCall::FindCandidates]);
        assert_eq!(h.store.snapshot().tasks.ids.len(), 0);
        assert!(h.notifier.all().is_empty());
    }
}

mod persistence_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_mutations_persist_issue_cache() {
        let h = Harness::start();
        h.load(
            IntegrationConfig::enabled("jdoe"),
            vec![issue("1", "X-1")],
            vec![],
        );
        settle().await;
        assert!(h.persistence.saves().is_empty());

        h.store.add_task(linked("a", "1"));
        settle().await;
        h.store.update_issue(issue("2", "X-2"));
        settle().await;

        assert_eq!(
            h.persistence.saves(),
            vec![("work".to_string(), 1), ("work".to_string(), 2)]
        );
        assert_eq!(h.persistence.last_active.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_save_without_active_project() {
        let h = Harness::start();
        h.load(IntegrationConfig::enabled("jdoe"), vec![], vec![]);
        settle().await;

        h.store.clear_project();
        h.store.add_task(Task::new("a", "A"));
        settle().await;

        assert!(h.persistence.saves().is_empty());
        assert_eq!(h.persistence.last_active.load(Ordering::SeqCst), 0);
    }
}

mod worklog_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sub_task_completion_targets_parent_issue() {
        let h = Harness::start();
        let config = IntegrationConfig {
            is_worklog_enabled: true,
            is_add_worklog_on_sub_task_done: true,
            ..IntegrationConfig::enabled("jdoe")
        };
        h.load(
            config,
            vec![issue("P", "X-1")],
            vec![
                linked("parent", "P").with_sub_tasks(vec![TaskId::new("child")]),
                Task::new("child", "Child").with_parent("parent"),
            ],
        );
        settle().await;

        h.store
            .update_task(&TaskId::new("child"), TaskChanges::mark_done())
            .unwrap();
        settle().await;

        assert_eq!(
            h.prompter.prompts(),
            vec![Prompt::Worklog {
                issue_id: "P".into(),
                task_id: "child".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_linked_sub_task_logs_against_parent_not_own_issue() {
        let h = Harness::start();
        let config = IntegrationConfig {
            is_worklog_enabled: true,
            is_add_worklog_on_sub_task_done: true,
            ..IntegrationConfig::enabled("jdoe")
        };
        h.load(
            config,
            vec![issue("P", "X-1"), issue("C", "X-2")],
            vec![
                linked("parent", "P").with_sub_tasks(vec![TaskId::new("child")]),
                linked("child", "C").with_parent("parent"),
            ],
        );
        settle().await;

        h.store
            .update_task(&TaskId::new("child"), TaskChanges::mark_done())
            .unwrap();
        settle().await;

        let prompts = h.prompter.prompts();
        assert_eq!(
            prompts,
            vec![Prompt::Worklog {
                issue_id: "P".into(),
                task_id: "child".into()
            }]
        );
        assert!(!prompts
            .iter()
            .any(|p| matches!(p, Prompt::Worklog { issue_id, .. } if issue_id == "C")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_title_change_does_not_prompt() {
        let h = Harness::start();
        let config = IntegrationConfig {
            is_worklog_enabled: true,
            ..IntegrationConfig::enabled("jdoe")
        };
        h.load(config, vec![issue("1", "X-1")], vec![linked("a", "1")]);
        settle().await;

        let rename = TaskChanges {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        h.store.update_task(&TaskId::new("a"), rename).unwrap();
        settle().await;

        assert!(h.prompter.prompts().is_empty());
    }
}

mod reassignment_tests {
    use super::*;

    fn reassign_config(user_name: &str) -> IntegrationConfig {
        IntegrationConfig {
            is_check_to_re_assign_ticket_on_task_start: true,
            ..IntegrationConfig::enabled(user_name)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_email_user_name_never_reassigns() {
        let h = Harness::start();
        h.prompter.confirm.store(true, Ordering::SeqCst);
        h.load(
            reassign_config("jdoe@example.com"),
            vec![issue("1", "X-1").with_assignee("bob", "Bob")],
            vec![linked("a", "1")],
        );
        settle().await;

        h.store.set_current_task(Some(TaskId::new("a")));
        settle().await;

        assert!(h.gateway.writes().is_empty());
        assert!(h.prompter.prompts().is_empty());
        let warnings: Vec<_> = h
            .notifier
            .all()
            .into_iter()
            .filter(|n| n.severity == Severity::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("didn't specify a username"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_reassignment_assigns_and_refreshes() {
        let h = Harness::start();
        h.prompter.confirm.store(true, Ordering::SeqCst);
        h.load(
            reassign_config("jdoe"),
            vec![RemoteIssue::new("1", "X-1", "Fix login")],
            vec![linked("a", "1")],
        );
        settle().await;

        h.store.set_current_task(Some(TaskId::new("a")));
        settle().await;

        assert_eq!(
            h.prompter.prompts(),
            vec![Prompt::Confirm(
                "\"Fix login\" is currently assigned to nobody. Do you want to assign it to yourself?"
                    .into()
            )]
        );
        assert_eq!(
            h.gateway.calls(),
            vec![
                GatewayCall::UpdateAssignee {
                    issue_id: "1".into(),
                    user_name: "jdoe".into()
                },
                GatewayCall::Refresh {
                    issue_id: "1".into(),
                    force: true,
                    dialog: false
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_declined_or_already_assigned_does_nothing() {
        let h = Harness::start();
        h.load(
            reassign_config("jdoe"),
            vec![
                issue("1", "X-1").with_assignee("bob", "Bob"),
                issue("2", "X-2").with_assignee("jdoe", "Jane Doe"),
            ],
            vec![linked("a", "1"), linked("b", "2")],
        );
        settle().await;

        h.store.set_current_task(Some(TaskId::new("a")));
        settle().await;
        assert_eq!(h.prompter.confirms(), 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        h.store.set_current_task(Some(TaskId::new("b")));
        settle().await;

        assert_eq!(h.prompter.confirms(), 1);
        assert!(h.gateway.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_five_seconds_apart_run_once() {
        let h = Harness::start();
        h.load(
            reassign_config("jdoe"),
            vec![issue("1", "X-1").with_assignee("bob", "Bob")],
            vec![linked("a", "1")],
        );
        settle().await;

        h.store.set_current_task(Some(TaskId::new("a")));
        settle().await;
        tokio::time::advance(Duration::from_secs(5)).await;
        h.store.update_issue(issue("1", "X-1").with_assignee("bob", "Bob"));
        settle().await;

        assert_eq!(h.prompter.confirms(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_twenty_seconds_apart_run_twice() {
        let h = Harness::start();
        h.load(
            reassign_config("jdoe"),
            vec![issue("1", "X-1").with_assignee("bob", "Bob")],
            vec![linked("a", "1")],
        );
        settle().await;

        h.store.set_current_task(Some(TaskId::new("a")));
        settle().await;
        tokio::time::advance(Duration::from_secs(20)).await;
        h.store.set_current_task(Some(TaskId::new("a")));
        settle().await;

        assert_eq!(h.prompter.confirms(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_issue_does_not_consume_throttle_window() {
        let h = Harness::start();
        h.load(reassign_config("jdoe"), vec![], vec![linked("a", "1")]);
        settle().await;

        h.store.set_current_task(Some(TaskId::new("a")));
        settle().await;
        assert_eq!(h.prompter.confirms(), 0);

        tokio::time::advance(Duration::from_secs(5)).await;
        h.store.update_issue(issue("1", "X-1").with_assignee("bob", "Bob"));
        settle().await;

        assert_eq!(h.prompter.confirms(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_task_checks_parent_issue() {
        let h = Harness::start();
        h.load(
            reassign_config("jdoe"),
            vec![RemoteIssue::new("P", "X-1", "Parent issue").with_assignee("bob", "Bob")],
            vec![
                linked("parent", "P").with_sub_tasks(vec![TaskId::new("child")]),
                Task::new("child", "Child").with_parent("parent"),
            ],
        );
        settle().await;

        h.store.set_current_task(Some(TaskId::new("child")));
        settle().await;

        assert_eq!(
            h.prompter.prompts(),
            vec![Prompt::Confirm(
                "\"Parent issue\" is currently assigned to Bob. Do you want to assign it to yourself?"
                    .into()
            )]
        );
    }
}

mod transition_tests {
    use super::*;

    fn transition_config(state: LocalState, policy: Option<TransitionPolicy>) -> IntegrationConfig {
        let mut config = IntegrationConfig {
            is_transition_issues_enabled: true,
            ..IntegrationConfig::enabled("jdoe")
        };
        config.transition_config.set(state, policy);
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_status_makes_no_gateway_call() {
        let h = Harness::start();
        h.load(
            transition_config(
                LocalState::InProgress,
                Some(TransitionPolicy::fixed("21", "In Progress")),
            ),
            vec![issue("1", "X-1").with_status("In Progress")],
            vec![linked("a", "1")],
        );
        settle().await;

        h.store.set_current_task(Some(TaskId::new("a")));
        settle().await;

        assert!(h.gateway.calls().is_empty());
        assert!(h.prompter.prompts().is_empty());
        assert!(h.notifier.all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_transition_on_start() {
        let h = Harness::start();
        h.load(
            transition_config(
                LocalState::InProgress,
                Some(TransitionPolicy::fixed("21", "In Progress")),
            ),
            vec![issue("1", "X-1").with_status("To Do")],
            vec![linked("a", "1")],
        );
        settle().await;

        h.store.set_current_task(Some(TaskId::new("a")));
        settle().await;

        assert_eq!(
            h.gateway.calls(),
            vec![
                GatewayCall::Transition {
                    issue_id: "1".into(),
                    transition_id: "21".into()
                },
                GatewayCall::Refresh {
                    issue_id: "1".into(),
                    force: true,
                    dialog: false
                },
            ]
        );
        let success = &h.notifier.all()[0];
        assert_eq!(success.severity, Severity::Success);
        assert_eq!(success.message, "Jira: Set issue X-1 to In Progress");
        assert!(success.subtle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_done_transition_falls_back_to_prompt() {
        let h = Harness::start();
        let invalid = TransitionPolicy::FixedTransition {
            id: None,
            name: "Done".into(),
        };
        h.load(
            transition_config(LocalState::Done, Some(invalid)),
            vec![issue("1", "X-1").with_status("In Progress")],
            vec![linked("a", "1")],
        );
        settle().await;

        h.store
            .update_task(&TaskId::new("a"), TaskChanges::mark_done())
            .unwrap();
        settle().await;

        let errors: Vec<_> = h
            .notifier
            .all()
            .into_iter()
            .filter(|n| n.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Jira: No valid transition configured");
        assert!(h.prompter.prompts().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;

        assert_eq!(
            h.prompter.prompts(),
            vec![Prompt::Transition {
                issue_id: "1".into(),
                state: LocalState::Done
            }]
        );
        assert!(h.gateway.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_ask_and_do_not() {
        let h = Harness::start();
        let mut config = transition_config(LocalState::Done, Some(TransitionPolicy::DoNotTransition));
        config
            .transition_config
            .set(LocalState::InProgress, Some(TransitionPolicy::AlwaysAsk));
        h.load(config, vec![issue("1", "X-1")], vec![linked("a", "1")]);
        settle().await;

        h.store.set_current_task(Some(TaskId::new("a")));
        h.store
            .update_task(&TaskId::new("a"), TaskChanges::mark_done())
            .unwrap();
        settle().await;

        assert_eq!(
            h.prompter.prompts(),
            vec![Prompt::Transition {
                issue_id: "1".into(),
                state: LocalState::InProgress
            }]
        );
        assert!(h.gateway.calls().is_empty());
    }
}

mod missing_data_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_missing_issues_reloaded_once_per_window() {
        let h = Harness::start();
        h.load(
            IntegrationConfig::enabled("jdoe"),
            vec![],
            vec![linked("a", "404"), Task::new("b", "Local")],
        );
        settle().await;

        assert_eq!(
            h.gateway.calls(),
            vec![GatewayCall::LoadMissing("404".into())]
        );
        assert_eq!(
            h.messages(),
            vec!["Jira: Tasks with missing issue data found. Reloading".to_string()]
        );

        h.engine
            .bus()
            .send_event(SyncEvent::MissingIssueData(vec![linked("a", "404")]));
        settle().await;
        assert_eq!(h.gateway.calls().len(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        h.engine
            .bus()
            .send_event(SyncEvent::MissingIssueData(vec![linked("a", "404")]));
        settle().await;
        assert_eq!(h.gateway.calls().len(), 2);
    }
}
