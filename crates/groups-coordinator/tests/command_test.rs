//! Command surface

mod common;

use assert_matches::assert_matches;
use common::{TestCluster, server, table};
use proven_groups_coordinator::{Error, GroupCommand, GroupCommandResponse};
use serde_json::json;

#[tokio::test]
async fn test_commands_from_json() {
    let (s1, s2) = (server(1), server(2));
    let test = TestCluster::new(&[s1.clone(), s2]).await;

    let commands = [
        json!({ "op": "add_group", "name": "A" }),
        json!({ "op": "move_servers", "servers": ["rs1:16020"], "target_group": "A" }),
        json!({ "op": "move_tables", "tables": ["default:t1"], "target_group": "A" }),
    ];
    for command in commands {
        let command: GroupCommand = serde_json::from_value(command).unwrap();
        assert_eq!(
            test.coordinator.execute(command).await.unwrap(),
            GroupCommandResponse::Done
        );
    }

    let group = test.group("A").await;
    assert!(group.contains_server(&s1));
    assert!(group.contains_table(&table("t1")));

    let response = test
        .coordinator
        .execute(GroupCommand::GetGroupOfTable { table: table("t1") })
        .await
        .unwrap();
    assert_matches!(response, GroupCommandResponse::Group { group: Some(g) } if g.name() == "A");

    let response = test
        .coordinator
        .execute(GroupCommand::BalanceGroup {
            name: "A".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(response, GroupCommandResponse::Balanced { ran: false });
}

#[tokio::test]
async fn test_missing_lists_are_rejected() {
    let test = TestCluster::new(&[server(1), server(2)]).await;
    test.coordinator.add_group("A").await.unwrap();
    let before = test.observer.events();

    let command: GroupCommand =
        serde_json::from_value(json!({ "op": "move_servers", "target_group": "A" })).unwrap();
    assert_matches!(
        test.coordinator.execute(command).await,
        Err(Error::InvalidArgument(_))
    );

    assert_matches!(
        test.coordinator
            .execute(GroupCommand::MoveTables {
                tables: None,
                target_group: Some("A".to_string()),
            })
            .await,
        Err(Error::InvalidArgument(_))
    );

    // Rejected before any hook ran
    assert_eq!(test.observer.events(), before);
}

#[tokio::test]
async fn test_move_servers_needs_a_target() {
    let test = TestCluster::new(&[server(1), server(2)]).await;

    for target_group in [None, Some(String::new())] {
        assert_matches!(
            test.coordinator
                .execute(GroupCommand::MoveServers {
                    servers: Some([server(1)].into()),
                    target_group,
                })
                .await,
            Err(Error::InvalidArgument(_))
        );
    }

    // An empty list wins over a missing target
    assert_eq!(
        test.coordinator
            .execute(GroupCommand::MoveServers {
                servers: Some([].into()),
                target_group: None,
            })
            .await
            .unwrap(),
        GroupCommandResponse::Done
    );
}

#[tokio::test]
async fn test_list_groups_response_serializes() {
    let test = TestCluster::new(&[server(1)]).await;

    let response = test
        .coordinator
        .execute(GroupCommand::ListGroups)
        .await
        .unwrap();
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["result"], "groups");
    assert_eq!(value["groups"][0]["name"], "default");
    assert_eq!(value["groups"][0]["servers"], json!(["rs1:16020"]));
}
