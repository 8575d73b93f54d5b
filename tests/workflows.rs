//! Wizard, tag checks and Kanban moves driven through the real services

mod common;

use std::time::Duration;

use common::{MockBackend, MockState, project, ticket};
use issuedesk::error::ApiError;
use issuedesk::kanban::{Board, DropEvent, DropOutcome, Viewer};
use issuedesk::models::{BoardStatus, IssueStatus, Logo, NewProject, ProjectType, Role};
use issuedesk::policy::Workflow;
use issuedesk::tags::{TagCheck, TagChecker};
use issuedesk::wizard::{Architecture, MicroserviceDraft, ProjectWizard, WizardError, WizardStep};

#[tokio::test]
async fn package_wizard_creates_package_then_microservices_under_it() {
    let backend = MockBackend::start().await;
    let projects = backend.client().projects();

    let mut wizard = ProjectWizard::new();
    wizard.choose_architecture(Architecture::Microservices).unwrap();
    wizard.next(&projects).await.unwrap();
    let mut details = NewProject::new("shop", "SHOP", ProjectType::Monolithic);
    details.technologies = vec!["Rust".into(), "Kafka".into()];
    wizard.set_details(details).unwrap();
    assert_eq!(wizard.next(&projects).await.unwrap(), WizardStep::Microservices);

    let package_id = wizard.package_id().unwrap();
    wizard.add_microservice(MicroserviceDraft::new("cart", "SHOP-CART")).unwrap();
    wizard.add_microservice(MicroserviceDraft::new("payments", "SHOP-PAY")).unwrap();
    let created = wizard.submit(&projects).await.unwrap();
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|p| p.parent_project == Some(package_id)));
    assert!(created.iter().all(|p| p.validate_hierarchy().is_ok()));
    assert_eq!(wizard.step(), WizardStep::Finished);

    let state = backend.state();
    assert_eq!(state.project_forms.len(), 3);
    let package_form = &state.project_forms[0];
    assert_eq!(package_form["projectType"], "MICROSERVICES_PACKAGE");
    assert_eq!(package_form["technologiesArray[1]"], "Kafka");
    assert!(!package_form.contains_key("parentProject.id"));
    for form in &state.project_forms[1..] {
        assert_eq!(form["projectType"], "MICROSERVICES");
        assert_eq!(form["parentProject.id"], package_id.to_string());
    }
}

#[tokio::test]
async fn failed_microservice_stays_pending_and_retry_does_not_duplicate() {
    let state = MockState {
        fail_on_tag: Some("SHOP-PAY".into()),
        ..MockState::default()
    };
    let backend = MockBackend::with_state(state).await;
    let projects = backend.client().projects();

    let mut wizard = ProjectWizard::new();
    wizard.choose_architecture(Architecture::Microservices).unwrap();
    wizard.next(&projects).await.unwrap();
    wizard
        .set_details(NewProject::new("shop", "SHOP", ProjectType::Monolithic))
        .unwrap();
    wizard.next(&projects).await.unwrap();
    wizard.add_microservice(MicroserviceDraft::new("cart", "SHOP-CART")).unwrap();
    wizard.add_microservice(MicroserviceDraft::new("payments", "SHOP-PAY")).unwrap();

    let err = wizard.submit(&projects).await.map(|_| ()).unwrap_err();
    assert!(matches!(err, WizardError::Api(ApiError::Server { status: 500, .. })));
    assert_eq!(wizard.created().len(), 1);
    assert_eq!(wizard.pending().len(), 1);
    assert_eq!(wizard.pending()[0].project_tag, "SHOP-PAY");
    assert_eq!(wizard.step(), WizardStep::Microservices);

    backend.state().fail_on_tag = None;
    wizard.submit(&projects).await.unwrap();
    assert_eq!(wizard.created().len(), 2);

    let tags: Vec<String> = backend
        .state()
        .project_forms
        .iter()
        .map(|f| f["projectTag"].clone())
        .collect();
    assert_eq!(tags, vec!["SHOP", "SHOP-CART", "SHOP-PAY"]);
}

#[tokio::test]
async fn removing_a_saved_microservice_deletes_it() {
    let backend = MockBackend::start().await;
    let projects = backend.client().projects();

    let mut wizard = ProjectWizard::new();
    wizard.choose_architecture(Architecture::Microservices).unwrap();
    wizard.next(&projects).await.unwrap();
    wizard
        .set_details(NewProject::new("shop", "SHOP", ProjectType::Monolithic))
        .unwrap();
    wizard.next(&projects).await.unwrap();
    wizard.add_microservice(MicroserviceDraft::new("cart", "SHOP-CART")).unwrap();
    wizard.submit(&projects).await.unwrap();

    let package_id = wizard.package_id().unwrap();
    assert_eq!(projects.sub_projects(package_id).await.unwrap().len(), 1);

    wizard.remove_microservice("shop-cart", &projects).await.unwrap();
    assert!(wizard.created().is_empty());
    assert!(projects.sub_projects(package_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn monolith_wizard_uploads_logo_and_finishes() {
    let backend = MockBackend::start().await;
    let projects = backend.client().projects();

    let mut details = NewProject::new("wiki", "WIKI", ProjectType::MicroservicesPackage);
    details.description = Some("internal docs".into());
    details.logo = Some(Logo {
        file_name: "wiki.png".into(),
        mime: "image/png".into(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    });

    let mut wizard = ProjectWizard::new();
    wizard.choose_architecture(Architecture::Monolithic).unwrap();
    wizard.next(&projects).await.unwrap();
    wizard.set_details(details).unwrap();
    assert_eq!(wizard.next(&projects).await.unwrap(), WizardStep::Finished);

    let project = wizard.project().unwrap();
    assert_eq!(project.project_type, ProjectType::Monolithic);
    assert_eq!(project.description.as_deref(), Some("internal docs"));
    assert!(wizard.package_id().is_none());

    let state = backend.state();
    assert_eq!(state.logo_uploads, vec![("wiki.png".to_string(), 4)]);
}

#[tokio::test]
async fn taken_tag_gets_free_suggestions() {
    let state = MockState {
        projects: vec![
            project(1, "shop", "SHOP", "MONOLITHIC", None),
            project(2, "shop two", "SHOP-2", "MONOLITHIC", None),
        ],
        ..MockState::default()
    };
    let backend = MockBackend::with_state(state).await;
    let checker = TagChecker::with_delay(backend.client().projects(), Duration::ZERO);

    match checker.check(" shop ").await.unwrap() {
        TagCheck::Taken { suggestions } => {
            assert_eq!(suggestions.len(), 3);
            assert!(!suggestions.iter().any(|s| s.eq_ignore_ascii_case("shop")));
            assert!(!suggestions.contains(&"shop-2".to_string()));
            assert_eq!(suggestions[0], "shop-v2");
        }
        other => panic!("expected taken, got {:?}", other),
    }
    assert_eq!(backend.state().tag_queries[0], "shop");

    assert_eq!(checker.check("BLOG").await.unwrap(), TagCheck::Available);
    assert_eq!(checker.check("   ").await.unwrap(), TagCheck::Empty);
}

fn board_state() -> MockState {
    MockState {
        tickets: vec![
            ticket(1, 9, "TO_DO", None),
            ticket(2, 9, "TO_DO", Some(5)),
            ticket(3, 9, "IN_PROGRESS", Some(5)),
            ticket(4, 9, "SOMETHING_ELSE", Some(5)),
        ],
        ..MockState::default()
    }
}

#[tokio::test]
async fn developer_drop_persists_the_new_status() {
    let backend = MockBackend::with_state(board_state()).await;
    let tickets = backend.client().tickets();
    let viewer = Viewer {
        user_id: 5,
        role: Role::Developer,
    };

    let loaded = tickets.for_project(9).await.unwrap();
    let mut board = Board::<IssueStatus>::from_tickets(&loaded, &viewer);
    let todo: Vec<i64> = board
        .column(IssueStatus::ToDo)
        .unwrap()
        .tickets
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(todo, vec![2, 4]);
    assert_eq!(board.hidden.len(), 1);

    let event = DropEvent {
        from: IssueStatus::ToDo,
        to: IssueStatus::InProgress,
        previous_index: 0,
        current_index: 0,
    };
    let outcome = board.drop_ticket(event, &viewer, &tickets).await.unwrap();
    assert_eq!(
        outcome,
        DropOutcome::Moved {
            ticket_id: 2,
            status: IssueStatus::InProgress
        }
    );
    assert_eq!(board.locate(2), Some((IssueStatus::InProgress, 0)));
    assert_eq!(backend.state().status_updates, vec![(2, "IN_PROGRESS".to_string())]);

    let reloaded = tickets.get(2).await.unwrap();
    assert_eq!(reloaded.status_as::<IssueStatus>(), Some(IssueStatus::InProgress));
}

#[tokio::test]
async fn failed_update_puts_the_ticket_back() {
    let state = MockState {
        fail_status_updates: true,
        ..board_state()
    };
    let backend = MockBackend::with_state(state).await;
    let tickets = backend.client().tickets();
    let viewer = Viewer {
        user_id: 5,
        role: Role::Developer,
    };

    let loaded = tickets.for_project(9).await.unwrap();
    let mut board = Board::<IssueStatus>::from_tickets(&loaded, &viewer);
    let event = DropEvent {
        from: IssueStatus::InProgress,
        to: IssueStatus::Resolved,
        previous_index: 0,
        current_index: 0,
    };

    let err = board.drop_ticket(event, &viewer, &tickets).await.unwrap_err();
    assert_eq!(err.status(), 500);
    assert_eq!(board.locate(3), Some((IssueStatus::InProgress, 0)));
    assert!(board.column(IssueStatus::Resolved).unwrap().tickets.is_empty());
    let ticket = board.tickets().find(|t| t.id == 3).unwrap();
    assert_eq!(ticket.status, "IN_PROGRESS");
    assert_eq!(backend.state().status_updates.len(), 1);
}

#[tokio::test]
async fn tester_cannot_start_work_and_nothing_is_sent() {
    let backend = MockBackend::with_state(board_state()).await;
    let tickets = backend.client().tickets();
    let viewer = Viewer {
        user_id: 8,
        role: Role::Tester,
    };

    let loaded = tickets.for_project(9).await.unwrap();
    let mut board = Board::<IssueStatus>::from_tickets(&loaded, &viewer);
    let event = DropEvent {
        from: IssueStatus::ToDo,
        to: IssueStatus::InProgress,
        previous_index: 0,
        current_index: 0,
    };

    let outcome = board.drop_ticket(event, &viewer, &tickets).await.unwrap();
    assert!(matches!(outcome, DropOutcome::Rejected { ticket_id: 1, .. }));
    assert_eq!(board.locate(1), Some((IssueStatus::ToDo, 0)));
    assert!(backend.state().status_updates.is_empty());
}

#[tokio::test]
async fn board_flow_uses_its_own_vocabulary() {
    let state = MockState {
        tickets: vec![
            ticket(1, 9, "PENDING", None),
            ticket(2, 9, "RESOLVED", Some(5)),
            ticket(3, 9, "TO_DO", None),
        ],
        ..MockState::default()
    };
    let backend = MockBackend::with_state(state).await;
    let tickets = backend.client().tickets();
    let viewer = Viewer {
        user_id: 8,
        role: Role::Tester,
    };

    let loaded = tickets.for_project(9).await.unwrap();
    let mut board = Board::<BoardStatus>::from_tickets(&loaded, &viewer);
    assert_eq!(board.column(BoardStatus::Pending).unwrap().tickets.len(), 2);
    assert_eq!(BoardStatus::Pending.label(), "To Do");

    let event = DropEvent {
        from: BoardStatus::Resolved,
        to: BoardStatus::Verified,
        previous_index: 0,
        current_index: 0,
    };
    let outcome = board.drop_ticket(event, &viewer, &tickets).await.unwrap();
    assert!(matches!(outcome, DropOutcome::Moved { ticket_id: 2, .. }));
    assert_eq!(backend.state().status_updates, vec![(2, "VERIFIED".to_string())]);
}
