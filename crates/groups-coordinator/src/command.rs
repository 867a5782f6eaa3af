//! Serializable administrative commands
//!
//! Commands carry their list arguments as `Option` so a request that omitted
//! a list can be told apart from one that sent an empty list.

use std::collections::BTreeSet;

use proven_groups::{GroupInfo, ServerAddress, TableName};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinator::GroupCoordinator;
use crate::error::{Error, GroupResult};

/// Administrative command against the group coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GroupCommand {
    /// Look up a group
    GetGroup {
        /// Group name
        name: String,
    },

    /// Look up the group a table is pinned to
    GetGroupOfTable {
        /// Table to look up
        table: TableName,
    },

    /// Look up the group a server belongs to
    GetGroupOfServer {
        /// Server to look up
        server: ServerAddress,
    },

    /// List every group
    ListGroups,

    /// Create an empty group
    AddGroup {
        /// Name of the new group
        name: String,
    },

    /// Delete an unused group
    RemoveGroup {
        /// Group to delete
        name: String,
    },

    /// Move servers and wait for them to drain
    MoveServers {
        /// Servers to move, all from the same group
        #[serde(default)]
        servers: Option<BTreeSet<ServerAddress>>,
        /// Destination group
        #[serde(default)]
        target_group: Option<String>,
    },

    /// Move tables; no target returns them to the default group
    MoveTables {
        /// Tables to move
        #[serde(default)]
        tables: Option<BTreeSet<TableName>>,
        /// Destination group
        #[serde(default)]
        target_group: Option<String>,
    },

    /// Balance one group
    BalanceGroup {
        /// Group to balance
        name: String,
    },
}

impl GroupCommand {
    /// Command name used in logs
    #[must_use]
    pub const fn command_type(&self) -> &'static str {
        match self {
            Self::GetGroup { .. } => "GetGroup",
            Self::GetGroupOfTable { .. } => "GetGroupOfTable",
            Self::GetGroupOfServer { .. } => "GetGroupOfServer",
            Self::ListGroups => "ListGroups",
            Self::AddGroup { .. } => "AddGroup",
            Self::RemoveGroup { .. } => "RemoveGroup",
            Self::MoveServers { .. } => "MoveServers",
            Self::MoveTables { .. } => "MoveTables",
            Self::BalanceGroup { .. } => "BalanceGroup",
        }
    }
}

/// Response to a [`GroupCommand`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GroupCommandResponse {
    /// The command completed with nothing to return
    Done,

    /// A single group lookup
    Group {
        /// The group, if any
        group: Option<GroupInfo>,
    },

    /// Every group
    Groups {
        /// All groups
        groups: Vec<GroupInfo>,
    },

    /// Outcome of a balance run
    Balanced {
        /// Whether any placement change was applied
        ran: bool,
    },
}

impl GroupCoordinator {
    /// Execute a command.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if a required list or target is missing, otherwise
    /// whatever the underlying operation returns.
    pub async fn execute(&self, command: GroupCommand) -> GroupResult<GroupCommandResponse> {
        debug!("Executing {}", command.command_type());

        match command {
            GroupCommand::GetGroup { name } => Ok(GroupCommandResponse::Group {
                group: self.get_group(&name).await?,
            }),
            GroupCommand::GetGroupOfTable { table } => Ok(GroupCommandResponse::Group {
                group: self.get_group_of_table(&table).await?,
            }),
            GroupCommand::GetGroupOfServer { server } => Ok(GroupCommandResponse::Group {
                group: self.get_group_of_server(&server).await?,
            }),
            GroupCommand::ListGroups => Ok(GroupCommandResponse::Groups {
                groups: self.list_groups().await?,
            }),
            GroupCommand::AddGroup { name } => {
                self.add_group(&name).await?;
                Ok(GroupCommandResponse::Done)
            }
            GroupCommand::RemoveGroup { name } => {
                self.remove_group(&name).await?;
                Ok(GroupCommandResponse::Done)
            }
            GroupCommand::MoveServers {
                servers,
                target_group,
            } => {
                let servers = servers.ok_or_else(|| {
                    Error::InvalidArgument("The list of servers cannot be null".to_string())
                })?;
                if servers.is_empty() {
                    return Ok(GroupCommandResponse::Done);
                }

                let target = target_group.filter(|target| !target.is_empty()).ok_or_else(|| {
                    Error::InvalidArgument("The target group cannot be null".to_string())
                })?;

                self.move_servers(&servers, &target).await?;
                Ok(GroupCommandResponse::Done)
            }
            GroupCommand::MoveTables {
                tables,
                target_group,
            } => {
                let tables = tables.ok_or_else(|| {
                    Error::InvalidArgument("The list of tables cannot be null".to_string())
                })?;

                self.move_tables(&tables, target_group.as_deref()).await?;
                Ok(GroupCommandResponse::Done)
            }
            GroupCommand::BalanceGroup { name } => Ok(GroupCommandResponse::Balanced {
                ran: self.balance_group(&name).await?,
            }),
        }
    }
}
