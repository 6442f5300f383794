//! Admin session commands.

use clap::Subcommand;
use logiport_portal::SessionContext;

use super::{print_json, print_line, secret_or_stdin};
use crate::error::CliError;

#[derive(Subcommand)]
pub enum AdminAction {
    /// Log in with the admin password
    Login {
        /// Admin password (read from stdin if omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Log out and clear cached data
    Logout,
    /// Show whether the stored admin token is still valid
    Status,
    /// List clients
    Clients,
    /// List shipments
    Shipments,
    /// List invoices
    Invoices,
    /// Show the revenue summary
    Revenue,
}

pub async fn run(context: &SessionContext, action: AdminAction) -> Result<(), CliError> {
    let admin = context.admin();
    match action {
        AdminAction::Login { password } => {
            let password = secret_or_stdin(password)?;
            admin.login(&password).await?;
            print_line("Admin logged in");
        }
        AdminAction::Logout => {
            admin.logout().await?;
            print_line("Admin logged out");
        }
        AdminAction::Status => {
            // Connecting already revalidated the stored token.
            if admin.is_authenticated().await {
                print_line("Admin session active");
            } else {
                print_line("Not logged in as admin");
            }
        }
        AdminAction::Clients => print_json(&admin.clients().await?)?,
        AdminAction::Shipments => print_json(&admin.shipments().await?)?,
        AdminAction::Invoices => print_json(&admin.invoices().await?)?,
        AdminAction::Revenue => print_json(&admin.revenue().await?)?,
    }
    Ok(())
}
