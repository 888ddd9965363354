//! Shop assistant chatbot.
//!
//! Messages are routed by keyword intent. Intents the shop can answer from
//! its own data (menu, promotions, orders, suggestions) never leave the
//! backend; everything else goes to the AI completion API when configured.

use std::fmt::Write as _;

use fastbite_core::{CurrencyCode, Price, Product};
use tracing::{debug, instrument, warn};

use crate::ai::AiClient;
use crate::services::recommendations::RecommendationService;
use crate::services::session::Session;

/// Products listed in a suggestion reply.
const SUGGESTION_COUNT: usize = 5;

/// Orders listed in an order status reply.
const RECENT_ORDER_COUNT: u32 = 3;

const SYSTEM_PROMPT: &str = "Bạn là trợ lý ảo của cửa hàng đồ ăn nhanh FastBite. \
Trả lời ngắn gọn, thân thiện, bằng ngôn ngữ của khách hàng. \
Chỉ trả lời các câu hỏi liên quan đến món ăn, đặt hàng, giao hàng và khuyến mãi của cửa hàng.";

const GREETING_REPLY: &str = "Xin chào! Mình là trợ lý FastBite. Bạn có thể hỏi mình về thực đơn, \
khuyến mãi, đơn hàng hoặc nhờ mình gợi ý món ăn nhé.";

const APOLOGY_REPLY: &str =
    "Xin lỗi, mình chưa thể trả lời câu hỏi này lúc này. Bạn vui lòng thử lại sau nhé.";

const SIGN_IN_REPLY: &str = "Bạn vui lòng đăng nhập để xem trạng thái đơn hàng.";

/// What the customer is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Vegetarian,
    OrderStatus,
    Promotion,
    Recommendation,
    Menu,
    Greeting,
    General,
}

/// Keywords per intent, checked in order. The first intent with a keyword
/// contained in the lower-cased message wins.
const VOCABULARY: &[(Intent, &[&str])] = &[
    (
        Intent::Vegetarian,
        &["chay", "vegetarian", "vegan", "không thịt", "no meat"],
    ),
    (
        Intent::OrderStatus,
        &[
            "đơn hàng",
            "đơn của tôi",
            "giao hàng",
            "trạng thái",
            "order status",
            "my order",
            "track",
            "delivery",
        ],
    ),
    (
        Intent::Promotion,
        &[
            "khuyến mãi",
            "khuyến mại",
            "giảm giá",
            "mã giảm",
            "ưu đãi",
            "voucher",
            "coupon",
            "promotion",
            "discount",
            "deal",
        ],
    ),
    (
        Intent::Recommendation,
        &[
            "gợi ý",
            "đề xuất",
            "nên ăn",
            "món ngon",
            "bán chạy",
            "recommend",
            "suggest",
            "best seller",
        ],
    ),
    (
        Intent::Menu,
        &["thực đơn", "menu", "danh mục", "có món gì", "category", "categories"],
    ),
    (
        Intent::Greeting,
        &["xin chào", "chào", "hello", "hey", "good morning"],
    ),
];

/// Classify a message by lower-cased substring matching.
#[must_use]
pub fn classify_intent(text: &str) -> Intent {
    let text = text.to_lowercase();
    VOCABULARY
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map_or(Intent::General, |(intent, _)| *intent)
}

/// A chatbot answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub intent: Intent,
    pub text: String,
    /// Products to render as cards under the text.
    pub products: Vec<Product>,
}

impl ChatReply {
    fn text(intent: Intent, text: impl Into<String>) -> Self {
        Self {
            intent,
            text: text.into(),
            products: Vec::new(),
        }
    }
}

/// Chatbot service.
#[derive(Debug, Clone)]
pub struct ChatbotService {
    session: Session,
    recommendations: RecommendationService,
    ai: Option<AiClient>,
    currency: CurrencyCode,
}

impl ChatbotService {
    #[must_use]
    pub const fn new(
        session: Session,
        recommendations: RecommendationService,
        ai: Option<AiClient>,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            session,
            recommendations,
            ai,
            currency,
        }
    }

    /// Answer a customer message. Never fails; backend or AI errors turn
    /// into a polite fallback reply.
    #[instrument(skip(self, message))]
    pub async fn reply(&self, message: &str) -> ChatReply {
        let intent = classify_intent(message);
        debug!(?intent, "Classified chat message");

        match intent {
            Intent::Recommendation => self.suggest(intent, false).await,
            Intent::Vegetarian => self.suggest(intent, true).await,
            Intent::OrderStatus => self.order_status().await,
            Intent::Promotion => self.promotions().await,
            Intent::Menu => self.menu().await,
            Intent::Greeting => ChatReply::text(intent, GREETING_REPLY),
            Intent::General => self.ask_ai(message).await,
        }
    }

    async fn suggest(&self, intent: Intent, vegetarian_only: bool) -> ChatReply {
        let products = match self
            .recommendations
            .recommend(SUGGESTION_COUNT, vegetarian_only)
            .await
        {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, "Chat suggestions failed");
                return ChatReply::text(intent, APOLOGY_REPLY);
            }
        };

        if products.is_empty() {
            return ChatReply::text(intent, "Hiện chưa có món phù hợp, bạn quay lại sau nhé.");
        }

        let mut text = if vegetarian_only {
            String::from("Các món chay dành cho bạn:")
        } else {
            String::from("Gợi ý cho bạn:")
        };
        for product in &products {
            let price = Price::new(product.price, self.currency);
            let _ = write!(text, "\n- {} ({price})", product.name);
        }

        ChatReply {
            intent,
            text,
            products,
        }
    }

    async fn order_status(&self) -> ChatReply {
        let intent = Intent::OrderStatus;
        match self.session.user() {
            Ok(Some(_)) => {}
            Ok(None) => return ChatReply::text(intent, SIGN_IN_REPLY),
            Err(e) => {
                warn!(error = %e, "Session unreadable");
                return ChatReply::text(intent, APOLOGY_REPLY);
            }
        }

        let orders = match self
            .session
            .api()
            .get_my_orders(1, RECENT_ORDER_COUNT)
            .await
        {
            Ok(page) => page.items,
            Err(e) if e.is_auth() => return ChatReply::text(intent, SIGN_IN_REPLY),
            Err(e) => {
                warn!(error = %e, "Chat order lookup failed");
                return ChatReply::text(intent, APOLOGY_REPLY);
            }
        };

        if orders.is_empty() {
            return ChatReply::text(intent, "Bạn chưa có đơn hàng nào.");
        }

        let mut text = String::from("Đơn hàng gần đây của bạn:");
        for order in &orders {
            let total = Price::new(order.total_amount, self.currency);
            let _ = write!(
                text,
                "\n- #{}: {} ({total})",
                order.reference(),
                order.status.label()
            );
        }
        ChatReply::text(intent, text)
    }

    async fn promotions(&self) -> ChatReply {
        let intent = Intent::Promotion;
        let promotions = match self.session.api().get_active_promotions().await {
            Ok(promotions) => promotions,
            Err(e) => {
                warn!(error = %e, "Chat promotion lookup failed");
                return ChatReply::text(intent, APOLOGY_REPLY);
            }
        };

        if promotions.is_empty() {
            return ChatReply::text(intent, "Hiện chưa có chương trình khuyến mãi nào.");
        }

        let mut text = String::from("Khuyến mãi đang diễn ra:");
        for promotion in &promotions {
            let _ = write!(text, "\n- {} ({})", promotion.code, promotion.value_label());
            if let Some(name) = &promotion.name {
                let _ = write!(text, ": {name}");
            }
        }
        ChatReply::text(intent, text)
    }

    async fn menu(&self) -> ChatReply {
        let intent = Intent::Menu;
        match self.session.api().get_categories().await {
            Ok(categories) if !categories.is_empty() => {
                let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
                ChatReply::text(
                    intent,
                    format!("Thực đơn của FastBite gồm: {}.", names.join(", ")),
                )
            }
            Ok(_) => ChatReply::text(intent, "Thực đơn đang được cập nhật."),
            Err(e) => {
                warn!(error = %e, "Chat menu lookup failed");
                ChatReply::text(intent, APOLOGY_REPLY)
            }
        }
    }

    async fn ask_ai(&self, message: &str) -> ChatReply {
        let intent = Intent::General;
        let Some(ai) = &self.ai else {
            debug!("No AI client configured");
            return ChatReply::text(intent, APOLOGY_REPLY);
        };

        match ai.complete(SYSTEM_PROMPT, message).await {
            Ok(text) => ChatReply::text(intent, text),
            Err(e) => {
                warn!(error = %e, "AI completion failed");
                ChatReply::text(intent, APOLOGY_REPLY)
            }
        }
    }
}
