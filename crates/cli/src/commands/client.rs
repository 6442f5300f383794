//! Client session commands.

use clap::Subcommand;
use logiport_core::{IdentifierError, MobileNumber, SignupProfile};
use logiport_portal::SessionContext;
use logiport_portal::session::ClientGate;

use super::{print_json, print_line, secret_or_stdin};
use crate::error::CliError;

#[derive(Subcommand)]
pub enum ClientAction {
    /// Log in with an email or mobile number and a password
    Login {
        /// Email address or 10-digit mobile number
        identifier: String,
        /// Password (read from stdin if omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// One-time code login
    Otp {
        #[command(subcommand)]
        action: OtpAction,
    },
    /// Create an account and log in
    Signup {
        /// Email address
        email: String,
        /// Contact name
        #[arg(long)]
        name: String,
        /// Company name
        #[arg(long)]
        company: Option<String>,
        /// Contact mobile number
        #[arg(long)]
        mobile: Option<String>,
        /// Billing address
        #[arg(long)]
        address: Option<String>,
        /// Password (read from stdin if omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Show the account status
    Status,
    /// Change the account password
    ChangePassword {
        /// Current password (read from stdin if omitted)
        #[arg(long)]
        current: Option<String>,
        /// New password (read from stdin if omitted)
        #[arg(long)]
        new: Option<String>,
        /// New password again (read from stdin if omitted)
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Show recent logins
    History,
    /// List shipments
    Shipments,
    /// List invoices
    Invoices,
    /// Log out and clear cached data
    Logout,
}

#[derive(Subcommand)]
pub enum OtpAction {
    /// Send a code to a mobile number
    Send {
        /// 10-digit mobile number
        mobile: String,
    },
    /// Log in with a received code
    Verify {
        /// 10-digit mobile number
        mobile: String,
        /// Code received by SMS
        code: String,
    },
}

pub async fn run(context: &SessionContext, action: ClientAction) -> Result<(), CliError> {
    let client = context.client();
    match action {
        ClientAction::Login {
            identifier,
            password,
        } => {
            let password = secret_or_stdin(password)?;
            client.login_with_password(&identifier, &password).await?;
            print_line("Logged in");
        }
        ClientAction::Otp {
            action: OtpAction::Send { mobile },
        } => {
            let mobile = client.send_otp(&mobile).await?;
            print_line(&format!("Code sent to {}", mobile.masked()));
        }
        ClientAction::Otp {
            action: OtpAction::Verify { mobile, code },
        } => {
            client.verify_otp(&mobile, &code).await?;
            print_line("Logged in");
        }
        ClientAction::Signup {
            email,
            name,
            company,
            mobile,
            address,
            password,
        } => {
            let mobile = mobile
                .as_deref()
                .map(MobileNumber::parse)
                .transpose()
                .map_err(|err| CliError::InvalidIdentifier(IdentifierError::from(err).to_string()))?;
            let profile = SignupProfile {
                full_name: name,
                company_name: company,
                mobile,
                address,
            };
            let password = secret_or_stdin(password)?;
            client.signup(&email, &password, None, &profile).await?;
            print_line("Account created");
        }
        ClientAction::Status => match client.gate().await? {
            ClientGate::SignedOut => print_line("Not logged in"),
            ClientGate::PasswordChangeRequired(status) => {
                print_line("Password change required");
                print_json(&status)?;
            }
            ClientGate::Ready(status) => print_json(&status)?,
        },
        ClientAction::ChangePassword {
            current,
            new,
            confirm,
        } => {
            let current = secret_or_stdin(current)?;
            let new = secret_or_stdin(new)?;
            let confirm = secret_or_stdin(confirm)?;
            client.change_password(&current, &new, &confirm).await?;
            print_line("Password changed");
        }
        ClientAction::History => print_json(&client.login_history().await?)?,
        ClientAction::Shipments => print_json(&client.shipments().await?)?,
        ClientAction::Invoices => print_json(&client.invoices().await?)?,
        ClientAction::Logout => {
            client.logout().await?;
            print_line("Logged out");
        }
    }
    Ok(())
}
