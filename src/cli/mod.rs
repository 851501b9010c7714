//! Interactive menu layer over the directory services.
//!
//! Two loops: a main menu (create user, log in) and a per-session user
//! menu. All store access goes through the library services; this module
//! owns every prompt and println.

use console::style;
use dialoguer::{Confirm, Input, Password, Select};

use crate::directory::UserDirectory;
use crate::error::{ProfNetError, Result};
use crate::graph::lifecycle::{Decision, RequestLifecycle, ResolveOutcome};
use crate::graph::requests::{BootstrapOutcome, RequestOutcome, RequestService};
use crate::graph::store::GraphStore;
use crate::messaging::MessageService;
use crate::types::{Message, NewUser, User};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run the interactive menu until the user exits.
pub fn run(store: &GraphStore) -> Result<()> {
    println!(
        "{}",
        style("ProfNet — professional networking directory").cyan().bold()
    );

    loop {
        let choice = Select::new()
            .with_prompt("Main menu")
            .items(&["Create user", "Log in", "Exit"])
            .default(0)
            .interact()?;

        match choice {
            0 => report(create_user(store)),
            1 => {
                if let Some(user) = report_value(log_in(store))? {
                    session(store, &user)?;
                }
            }
            _ => {
                println!("Bye!");
                return Ok(());
            }
        }
    }
}

/// The per-login menu loop.
fn session(store: &GraphStore, user: &User) -> Result<()> {
    println!("Logged in as {}", style(&user.user_id).green());

    loop {
        let choice = Select::new()
            .with_prompt(format!("Menu ({})", user.user_id))
            .items(&[
                "Friend list",
                "Search people",
                "Connection request",
                "Pending requests",
                "New message",
                "View messages",
                "Change password",
                "Log out",
            ])
            .default(0)
            .interact()?;

        match choice {
            0 => report(friend_list(store, user)),
            1 => report(search_people(store)),
            2 => report(connection_request(store, user)),
            3 => report(pending_requests(store, user)),
            4 => report(new_message(store, user)),
            5 => report(view_messages(store, user)),
            6 => report(change_password(store, user)),
            _ => return Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome presentation
// ---------------------------------------------------------------------------

/// Print an action's error, if any, and keep the menu loop alive.
fn report(result: Result<()>) {
    if let Err(err) = result {
        println!("{} {}", style("error:").red().bold(), err);
    }
}

/// Like [`report`], but passes a value through. Prompt and I/O failures
/// still abort.
fn report_value<T>(result: Result<Option<T>>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(value),
        Err(err @ (ProfNetError::Prompt(_) | ProfNetError::Io(_))) => Err(err),
        Err(err) => {
            println!("{} {}", style("error:").red().bold(), err);
            Ok(None)
        }
    }
}

fn format_time(ts: i64) -> String {
    match chrono::DateTime::from_timestamp(ts, 0) {
        Some(time) => time.format("%Y-%m-%d %H:%M").to_string(),
        None => ts.to_string(),
    }
}

fn print_user(user: &User) {
    let birth = user.date_of_birth.as_deref().unwrap_or("-");
    println!(
        "  {}  {}  {}  born {}",
        style(&user.user_id).bold(),
        user.name,
        user.email,
        birth
    );
}

fn print_message(msg: &Message) {
    println!(
        "  #{} [{}] {} -> {}: {}",
        msg.msg_id,
        format_time(msg.send_time),
        msg.sender_id,
        msg.receiver_id,
        msg.contents
    );
}

// ---------------------------------------------------------------------------
// Main menu actions
// ---------------------------------------------------------------------------

fn create_user(store: &GraphStore) -> Result<()> {
    let user_id: String = Input::new().with_prompt("User login").interact_text()?;
    let password = Password::new().with_prompt("Password").interact()?;
    let email: String = Input::new().with_prompt("Email").interact_text()?;
    let name: String = Input::new().with_prompt("Name").interact_text()?;
    let birth: String = Input::new()
        .with_prompt("Date of birth (YYYY-MM-DD, optional)")
        .allow_empty(true)
        .interact_text()?;

    let user = UserDirectory::new(store).register(NewUser {
        user_id,
        password,
        name,
        email,
        date_of_birth: if birth.is_empty() { None } else { Some(birth) },
    })?;
    println!("User {} created.", style(&user.user_id).green());
    Ok(())
}

fn log_in(store: &GraphStore) -> Result<Option<User>> {
    let user_id: String = Input::new().with_prompt("User login").interact_text()?;
    let password = Password::new().with_prompt("Password").interact()?;

    let user = UserDirectory::new(store).authenticate(&user_id, &password)?;
    if user.is_none() {
        println!("{}", style("Invalid login or password.").yellow());
    }
    Ok(user)
}

// ---------------------------------------------------------------------------
// Session actions
// ---------------------------------------------------------------------------

fn friend_list(store: &GraphStore, user: &User) -> Result<()> {
    let friends = UserDirectory::new(store).friends_of(&user.user_id)?;
    if friends.is_empty() {
        println!("You don't have any connections yet.");
        return Ok(());
    }
    println!("Your connections:");
    for friend in &friends {
        print_user(friend);
    }
    Ok(())
}

fn search_people(store: &GraphStore) -> Result<()> {
    let name: String = Input::new().with_prompt("Search people by name").interact_text()?;
    let found = UserDirectory::new(store).search_by_name(&name)?;
    if found.is_empty() {
        println!("No matches.");
        return Ok(());
    }
    for user in &found {
        print_user(user);
    }
    println!("total row(s): {}", found.len());
    Ok(())
}

fn connection_request(store: &GraphStore, user: &User) -> Result<()> {
    let service = RequestService::new(store);
    let target: String = Input::new().with_prompt("Request user id").interact_text()?;

    match service.request_connection(&user.user_id, &target)? {
        RequestOutcome::Inserted => {
            println!("{}", style("Request sent.").green());
        }
        RequestOutcome::AlreadyPending => {
            println!("Already in your list, no need to request again.");
        }
        RequestOutcome::OutOfRange => {
            println!("{}", style("No relation path within range.").yellow());
        }
        RequestOutcome::BootstrapStarted => {
            println!("Welcome! As a new user you can send up to 5 connection requests.");
            bootstrap(store, user, &target)?;
        }
    }
    Ok(())
}

/// The new-user flow: the first pick is the one that triggered bootstrap,
/// then keep asking until quota or the user stops.
fn bootstrap(store: &GraphStore, user: &User, first_target: &str) -> Result<()> {
    let service = RequestService::new(store);
    let mut session = service.bootstrap(&user.user_id)?;
    let mut target = first_target.to_string();

    loop {
        match session.request(&target) {
            Ok(BootstrapOutcome::Requested { remaining }) => {
                println!(
                    "{} You can send {} more request(s).",
                    style("Request sent.").green(),
                    remaining
                );
                if remaining == 0 {
                    return Ok(());
                }
            }
            Ok(BootstrapOutcome::AlreadyPending) => {
                println!("Already in your list, no need to request again.");
            }
            Ok(BootstrapOutcome::QuotaExhausted) => {
                println!("{}", style("Request quota spent.").yellow());
                return Ok(());
            }
            Err(err @ (ProfNetError::Prompt(_) | ProfNetError::Io(_) | ProfNetError::Store(_))) => {
                return Err(err);
            }
            Err(err) => {
                println!("{} {}", style("error:").red().bold(), err);
            }
        }

        if !Confirm::new()
            .with_prompt("Send another request?")
            .default(true)
            .interact()?
        {
            return Ok(());
        }
        target = Input::new().with_prompt("Request user id").interact_text()?;
    }
}

fn pending_requests(store: &GraphStore, user: &User) -> Result<()> {
    let lifecycle = RequestLifecycle::new(store);
    let pending = lifecycle.pending_requests_for(&user.user_id)?;
    if pending.is_empty() {
        println!("No requests right now.");
        return Ok(());
    }

    let labels: Vec<String> = pending
        .iter()
        .map(|edge| format!("{} (sent {})", edge.requester_id, format_time(edge.created_at)))
        .collect();
    let picked = Select::new()
        .with_prompt("Pending requests")
        .items(&labels)
        .default(0)
        .interact()?;

    let decision = match Select::new()
        .with_prompt("Decision")
        .items(&["Accept", "Reject"])
        .default(0)
        .interact()?
    {
        0 => Decision::Accept,
        _ => Decision::Reject,
    };

    match lifecycle.resolve(&pending[picked], &user.user_id, decision)? {
        ResolveOutcome::Updated => println!("{}", style("Updated.").green()),
        ResolveOutcome::AlreadyResolved => println!("That request was already resolved."),
    }
    Ok(())
}

fn new_message(store: &GraphStore, user: &User) -> Result<()> {
    let receiver: String = Input::new().with_prompt("Send to user id").interact_text()?;
    let contents: String = Input::new().with_prompt("Message").interact_text()?;

    let msg = MessageService::new(store).send(&user.user_id, &receiver, &contents)?;
    println!("{}", style("Sent!").green());
    print_message(&msg);
    Ok(())
}

fn view_messages(store: &GraphStore, user: &User) -> Result<()> {
    let service = MessageService::new(store);

    let sent = service.sent_view(&user.user_id)?;
    println!("You sent:");
    if sent.is_empty() {
        println!("  (nothing)");
    }
    for msg in &sent {
        print_message(msg);
    }

    let received = service.received_view(&user.user_id)?;
    println!("You received:");
    if received.is_empty() {
        println!("  (nothing)");
    }
    for msg in &received {
        print_message(msg);
    }

    if sent.is_empty() && received.is_empty() {
        return Ok(());
    }
    if Confirm::new()
        .with_prompt("Delete a message?")
        .default(false)
        .interact()?
    {
        let msg_id: i64 = Input::new().with_prompt("Message id").interact_text()?;
        service.delete(msg_id, &user.user_id)?;
        println!("{}", style("Deleted from your view.").green());
    }
    Ok(())
}

fn change_password(store: &GraphStore, user: &User) -> Result<()> {
    let new_password = Password::new()
        .with_prompt("New password")
        .with_confirmation("Repeat new password", "Passwords do not match")
        .interact()?;
    UserDirectory::new(store).change_password(&user.user_id, &new_password)?;
    println!("{}", style("Password changed.").green());
    Ok(())
}
