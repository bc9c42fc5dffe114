//! In-memory stand-in for the Discord API.

use serenity::all::{ChannelId, MessageId, RoleId, UserId};
use serenity::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::AppError;
use crate::model::{
    approval::RoleAction,
    audit::AuditEntry,
    member::Member,
    message::{ChannelMessage, EmbedSummary, MessageRef},
    notice::OutgoingMessage,
};
use crate::service::gateway::DiscordGateway;

/// User id the fake reports as the author of everything the bot posts.
pub const BOT_USER_ID: u64 = 999;

/// A message posted through the fake.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub channel_id: ChannelId,
    pub reference: MessageRef,
    pub message: OutgoingMessage,
}

/// Records every call and serves members/messages from memory.
///
/// Failure toggles make the next calls of a given kind return
/// `AppError::CollaboratorFailure` until switched off again.
#[derive(Default)]
pub struct FakeDiscord {
    members: Mutex<BTreeMap<UserId, Member>>,
    bots: Mutex<HashSet<UserId>>,
    audit_entries: Mutex<Vec<AuditEntry>>,
    channel_messages: Mutex<HashMap<ChannelId, Vec<ChannelMessage>>>,
    sent: Mutex<Vec<SentMessage>>,
    edits: Mutex<Vec<(MessageRef, OutgoingMessage)>>,
    pins: Mutex<Vec<MessageRef>>,
    suppressed: Mutex<Vec<MessageRef>>,
    role_calls: Mutex<Vec<(RoleAction, UserId, RoleId)>>,
    fail_mutations: AtomicBool,
    fail_sends: AtomicBool,
    fail_member_fetch: AtomicBool,
    fetch_message_calls: AtomicUsize,
    next_id: AtomicU64,
}

impl FakeDiscord {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(10_000),
            ..Default::default()
        }
    }

    pub fn add_member(&self, member: Member) {
        self.members.lock().unwrap().insert(member.id, member);
    }

    pub fn member(&self, user_id: UserId) -> Option<Member> {
        self.members.lock().unwrap().get(&user_id).cloned()
    }

    pub fn mark_bot(&self, user_id: UserId) {
        self.bots.lock().unwrap().insert(user_id);
    }

    /// Adds an audit entry; newest entries are pushed last.
    pub fn push_audit_entry(&self, entry: AuditEntry) {
        self.audit_entries.lock().unwrap().push(entry);
    }

    /// Makes a message visible to `fetch_messages` and `fetch_message`.
    pub fn push_channel_message(&self, message: ChannelMessage) {
        self.channel_messages
            .lock()
            .unwrap()
            .entry(message.channel_id)
            .or_default()
            .push(message);
    }

    pub fn set_fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_member_fetch(&self, fail: bool) {
        self.fail_member_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages posted to `channel_id`, oldest first.
    pub fn sent_to(&self, channel_id: ChannelId) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|sent| sent.channel_id == channel_id)
            .map(|sent| sent.message.clone())
            .collect()
    }

    pub fn edits(&self) -> Vec<(MessageRef, OutgoingMessage)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn pins(&self) -> Vec<MessageRef> {
        self.pins.lock().unwrap().clone()
    }

    pub fn suppressed(&self) -> Vec<MessageRef> {
        self.suppressed.lock().unwrap().clone()
    }

    pub fn role_calls(&self) -> Vec<(RoleAction, UserId, RoleId)> {
        self.role_calls.lock().unwrap().clone()
    }

    pub fn fetch_message_calls(&self) -> usize {
        self.fetch_message_calls.load(Ordering::SeqCst)
    }

    fn next_message_id(&self) -> MessageId {
        MessageId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn mutate(&self, action: RoleAction, user_id: UserId, role_id: RoleId) -> Result<(), AppError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(AppError::CollaboratorFailure(
                "role mutation rejected".to_string(),
            ));
        }

        let mut members = self.members.lock().unwrap();
        let member = members
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("member {}", user_id)))?;
        match action {
            RoleAction::Add => member.roles.insert(role_id),
            RoleAction::Remove => member.roles.remove(&role_id),
        };
        self.role_calls
            .lock()
            .unwrap()
            .push((action, user_id, role_id));
        Ok(())
    }
}

#[async_trait]
impl DiscordGateway for FakeDiscord {
    async fn fetch_member(&self, user_id: UserId) -> Result<Member, AppError> {
        if self.fail_member_fetch.load(Ordering::SeqCst) {
            return Err(AppError::CollaboratorFailure("member fetch failed".to_string()));
        }
        self.member(user_id)
            .ok_or_else(|| AppError::NotFound(format!("member {}", user_id)))
    }

    async fn list_members(
        &self,
        after: Option<UserId>,
        limit: u64,
    ) -> Result<Vec<Member>, AppError> {
        let members = self.members.lock().unwrap();
        Ok(members
            .values()
            .filter(|member| after.map_or(true, |after| member.id > after))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn add_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        _reason: &str,
    ) -> Result<(), AppError> {
        self.mutate(RoleAction::Add, user_id, role_id)
    }

    async fn remove_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        _reason: &str,
    ) -> Result<(), AppError> {
        self.mutate(RoleAction::Remove, user_id, role_id)
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageRef, AppError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(AppError::CollaboratorFailure("send failed".to_string()));
        }

        let reference = MessageRef::new(channel_id, self.next_message_id());
        self.push_channel_message(ChannelMessage {
            id: reference.message_id,
            channel_id,
            author: UserId::new(BOT_USER_ID),
            author_is_bot: true,
            content: message.content.clone().unwrap_or_default(),
            mentions: Vec::new(),
            embeds: message
                .notice
                .iter()
                .map(|notice| EmbedSummary {
                    title: Some(notice.title.clone()),
                    fields: notice
                        .fields
                        .iter()
                        .map(|field| (field.name.clone(), field.value.clone()))
                        .collect(),
                })
                .collect(),
        });
        self.sent.lock().unwrap().push(SentMessage {
            channel_id,
            reference,
            message,
        });
        Ok(reference)
    }

    async fn edit_message(
        &self,
        message: MessageRef,
        edit: OutgoingMessage,
    ) -> Result<(), AppError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(AppError::CollaboratorFailure("edit failed".to_string()));
        }
        self.edits.lock().unwrap().push((message, edit));
        Ok(())
    }

    async fn pin_message(&self, message: MessageRef) -> Result<(), AppError> {
        self.pins.lock().unwrap().push(message);
        Ok(())
    }

    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, AppError> {
        let messages = self.channel_messages.lock().unwrap();
        Ok(messages
            .get(&channel_id)
            .map(|messages| {
                messages
                    .iter()
                    .rev()
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_message(&self, message: MessageRef) -> Result<ChannelMessage, AppError> {
        self.fetch_message_calls.fetch_add(1, Ordering::SeqCst);
        self.channel_messages
            .lock()
            .unwrap()
            .get(&message.channel_id)
            .and_then(|messages| messages.iter().find(|m| m.id == message.message_id))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("message {}", message.message_id)))
    }

    async fn suppress_embeds(&self, message: MessageRef) -> Result<(), AppError> {
        self.suppressed.lock().unwrap().push(message);
        Ok(())
    }

    async fn role_update_audit_entries(&self, limit: u8) -> Result<Vec<AuditEntry>, AppError> {
        Ok(self
            .audit_entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn is_bot(&self, user_id: UserId) -> Result<bool, AppError> {
        Ok(self.bots.lock().unwrap().contains(&user_id))
    }
}
