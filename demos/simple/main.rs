use careflow::{Audience, Branch, Channel, Editor, Node, RegistryBuilder, TriggerType};

#[tokio::main]
async fn main() -> careflow::Result<()> {
    let registry = RegistryBuilder::new().build()?;

    let mut editor = Editor::open(&registry, &TriggerType::AppointmentCreated, Audience::New).await?;
    println!("Opened '{}' (saved: {})", editor.document().name, editor.document().is_persisted());

    // Ask for a reply after the reminder, and chase non-responders by email.
    let sms_id = editor.tree().ids()[4].clone();
    let replied = Node::condition();
    let replied_id = replied.id.clone();
    let _ = editor.append_child(&sms_id, replied)?;
    let _ = editor.append_to_branch(&replied_id, Branch::True, Node::action(Channel::Sms).with_message("Thanks {PatientName}, see you at {Time}."))?;
    let _ = editor.append_to_branch(&replied_id, Branch::False, Node::action(Channel::Email).with_message("We have not heard from you, {PatientName}."))?;

    let preview = editor.preview()?;
    println!("Discarded false-path nodes: {:?}", preview.discarded);

    let saved = editor.save(&registry).await?;
    println!("Saved as {:?}", saved.id);
    println!("{}", serde_json::to_string_pretty(&saved.compiled_steps)?);

    Ok(())
}
