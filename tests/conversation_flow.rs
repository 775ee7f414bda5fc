//! End-to-end flows through the update pipeline with a stub channel and a
//! recording operator inbox.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use brief_assist::bot::process_update;
use brief_assist::catalog::parse_catalog;
use brief_assist::channels::{Channel, IncomingUpdate, UpdateKind, UpdateStream};
use brief_assist::conversation::{
    ConversationEngine, ConversationService, DeliveryMode, FlowState, PromptInstruction, Reply,
};
use brief_assist::dispatch::{Dispatcher, LeadId, LeadSink, Notifier};
use brief_assist::error::{ChannelError, DispatchError};
use brief_assist::session::{Answer, InMemorySessionStore, SummarySnapshot};
use brief_assist::summary::{OperatorLayout, PLACEHOLDER};

const CATALOG: &str = r#"
shop:
  title: Online shop
  questions:
    - id: company_name
      text: "🏷️ Brand name?"
    - id: payments
      text: "💳 Payment methods?"
      options: [Cards, PayPal, Crypto]
      multi: true
    - id: platform
      text: "🧱 Platform?"
      options: [Shopify, Custom]
  operator_fields:
    - { id: company_name, label: "Brand" }
    - { id: payments, label: "Payments" }
    - { id: platform, label: "Platform" }
    - { id: deadline, label: "Deadline" }
"#;

#[derive(Default)]
struct StubChannel {
    acknowledged: Mutex<Vec<String>>,
    delivered: Mutex<Vec<Reply>>,
}

#[async_trait]
impl Channel for StubChannel {
    fn name(&self) -> &str {
        "stub"
    }

    async fn start(&self) -> Result<UpdateStream, ChannelError> {
        Ok(Box::pin(futures::stream::empty::<IncomingUpdate>()))
    }

    async fn acknowledge(&self, update: &IncomingUpdate) -> Result<(), ChannelError> {
        if let UpdateKind::Callback { query_id, .. } = &update.kind {
            self.acknowledged.lock().unwrap().push(query_id.clone());
        }
        Ok(())
    }

    async fn deliver(&self, _update: &IncomingUpdate, reply: &Reply) -> Result<(), ChannelError> {
        self.delivered.lock().unwrap().push(reply.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

#[derive(Default)]
struct Inbox(Mutex<Vec<String>>);

#[async_trait]
impl Notifier for Inbox {
    fn destination(&self) -> String {
        "inbox".into()
    }

    async fn notify(&self, text: &str) -> Result<(), DispatchError> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct CountingSink(Mutex<Vec<SummarySnapshot>>);

#[async_trait]
impl LeadSink for CountingSink {
    fn name(&self) -> &str {
        "counting"
    }

    async fn create_lead(
        &self,
        snapshot: &SummarySnapshot,
        _summary_text: &str,
    ) -> Result<Option<LeadId>, DispatchError> {
        let mut leads = self.0.lock().unwrap();
        leads.push(snapshot.clone());
        Ok(Some(LeadId(format!("L{}", leads.len()))))
    }
}

struct Harness {
    channel: StubChannel,
    service: ConversationService,
    inbox: Arc<Inbox>,
    leads: Arc<CountingSink>,
}

impl Harness {
    fn new() -> Self {
        let catalog = Arc::new(parse_catalog(CATALOG, "shop").unwrap());
        let inbox = Arc::new(Inbox::default());
        let leads = Arc::new(CountingSink::default());
        let dispatcher = Dispatcher::new(OperatorLayout::for_catalog(&catalog))
            .with_notifier(inbox.clone())
            .with_lead_sink(leads.clone());
        let service = ConversationService::new(
            ConversationEngine::new(catalog),
            InMemorySessionStore::new(),
            Arc::new(dispatcher),
        );
        Self {
            channel: StubChannel::default(),
            service,
            inbox,
            leads,
        }
    }

    async fn text(&self, text: &str) -> Option<Reply> {
        let update = IncomingUpdate::new("stub", "42", "42", UpdateKind::Text(text.into()));
        process_update(&self.channel, &self.service, update).await
    }

    async fn press(&self, data: &str) -> Option<Reply> {
        let update = IncomingUpdate::new(
            "stub",
            "42",
            "42",
            UpdateKind::Callback {
                query_id: format!("q-{data}"),
                data: data.into(),
            },
        )
        .with_message_id(100);
        process_update(&self.channel, &self.service, update).await
    }

    async fn complete(&self) {
        self.text("/start").await;
        self.text("Acme").await;
        self.press("opt:payments:0").await;
        self.press("opt:payments:1").await;
        self.press("next:payments").await;
        self.press("opt:platform:0").await;
    }
}

#[tokio::test]
async fn full_brief_reaches_operator() {
    let h = Harness::new();

    let reply = h.text("/start").await.unwrap();
    assert!(reply.preamble.is_some());
    assert_eq!(reply.instruction.question_id(), Some("company_name"));

    let reply = h.text("Acme").await.unwrap();
    assert_eq!(reply.instruction.question_id(), Some("payments"));
    assert_eq!(reply.delivery, DeliveryMode::SendNew);

    h.press("opt:payments:0").await;
    let reply = h.press("opt:payments:1").await.unwrap();
    assert_eq!(reply.delivery, DeliveryMode::EditInPlace);
    match &reply.instruction {
        PromptInstruction::ShowQuestion {
            layout: Some(layout),
            ..
        } => {
            let selected: Vec<_> = layout
                .rows
                .iter()
                .flatten()
                .filter(|b| b.selected)
                .map(|b| b.label.as_str())
                .collect();
            assert_eq!(selected, ["Cards", "PayPal"]);
        }
        other => panic!("expected payments question, got {other:?}"),
    }

    h.press("next:payments").await;
    let reply = h.press("opt:platform:0").await.unwrap();
    assert!(reply.instruction.is_summary());
    assert_eq!(h.service.flow_state("42").await, Some(FlowState::Complete));

    let reply = h.press("confirm:yes").await.unwrap();
    assert!(matches!(
        reply.instruction,
        PromptInstruction::ShowPlainMessage { .. }
    ));

    let sent = h.inbox.0.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0],
        format!(
            "🐾 *New project: Online shop*\n\n\
             Brand: Acme\n\
             Payments: Cards, PayPal\n\
             Platform: Shopify\n\
             Deadline: {PLACEHOLDER}\n\
             \n🔗 CRM lead: L1"
        )
    );

    let leads = h.leads.0.lock().unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(
        leads[0].get("payments"),
        Some(&Answer::Multi(vec!["Cards".into(), "PayPal".into()]))
    );
}

#[tokio::test]
async fn edit_from_summary_changes_one_answer() {
    let h = Harness::new();
    h.complete().await;

    let reply = h.press("edit:platform").await.unwrap();
    assert_eq!(reply.instruction.question_id(), Some("platform"));
    assert_eq!(
        h.service.flow_state("42").await,
        Some(FlowState::Editing("platform".into()))
    );

    let reply = h.press("opt:platform:1").await.unwrap();
    assert!(reply.instruction.is_summary());

    let session = h.service.session("42").await.unwrap();
    assert_eq!(session.answer("platform"), Some(&Answer::Single("Custom".into())));
    assert_eq!(session.answer("company_name"), Some(&Answer::Single("Acme".into())));
    assert_eq!(
        session.answer("payments"),
        Some(&Answer::Multi(vec!["Cards".into(), "PayPal".into()]))
    );
}

#[tokio::test]
async fn double_confirm_dispatches_once() {
    let h = Harness::new();
    h.complete().await;

    h.press("confirm:yes").await;
    h.press("confirm:yes").await;

    assert_eq!(h.inbox.0.lock().unwrap().len(), 1);
    assert_eq!(h.leads.0.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn reset_starts_over() {
    let h = Harness::new();
    h.complete().await;

    let reply = h.press("confirm:reset").await.unwrap();
    assert_eq!(reply.instruction.question_id(), Some("company_name"));
    let session = h.service.session("42").await.unwrap();
    assert!(session.answers.is_empty());
    assert_eq!(session.cursor, 0);
}

#[tokio::test]
async fn stale_or_unknown_buttons_get_a_notice() {
    let h = Harness::new();
    h.text("/start").await;
    let before = h.service.session("42").await;

    let reply = h.press("opt:payments:9").await.unwrap();
    assert!(matches!(
        reply.instruction,
        PromptInstruction::ShowPlainMessage { .. }
    ));
    assert_eq!(reply.delivery, DeliveryMode::SendNew);

    let reply = h.press("edit:nonexistent").await.unwrap();
    assert_eq!(reply.delivery, DeliveryMode::SendNew);
    assert_eq!(h.service.session("42").await, before);
}

#[tokio::test]
async fn callbacks_are_acknowledged_even_when_ignored() {
    let h = Harness::new();
    assert!(h.press("garbage").await.is_none());
    assert!(h.text("/help").await.is_none());

    h.press("opt:payments:0").await;
    let acked = h.channel.acknowledged.lock().unwrap();
    assert_eq!(*acked, vec!["q-garbage", "q-opt:payments:0"]);
    assert_eq!(h.channel.delivered.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn shipped_catalog_is_valid() {
    let yaml = include_str!("../questions.yaml");
    let catalog = parse_catalog(yaml, "ecommerce").unwrap();
    assert_eq!(catalog.len(), 20);

    let layout = OperatorLayout::for_catalog(&catalog);
    for field in &layout.fields {
        assert!(
            catalog.find(&field.id).is_some(),
            "operator field {} has no question",
            field.id
        );
    }
}
