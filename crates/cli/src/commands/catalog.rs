//! Menu browsing, reviews, recommendations and the chat assistant.
#![allow(clippy::print_stdout)]

use clap::{Args, Subcommand};
use fastbite_core::{BannerPosition, CategoryId, NewReview, Product, ProductId};
use fastbite_storefront::Storefront;
use fastbite_storefront::api::{ProductQuery, ProductSort};

use super::{CliResult, money};

#[derive(Args)]
pub struct ProductsArgs {
    /// Full-text search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Category id
    #[arg(short, long)]
    pub category: Option<String>,

    /// Only vegetarian dishes
    #[arg(long)]
    pub vegetarian: bool,

    /// Show one product in detail
    #[arg(long, conflicts_with_all = ["search", "category"])]
    pub id: Option<String>,

    #[arg(short, long, default_value_t = 1)]
    pub page: u32,

    #[arg(short, long, default_value_t = 12)]
    pub limit: u32,
}

#[derive(Subcommand)]
pub enum ReviewsAction {
    /// List reviews for a product
    List {
        product_id: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Review a product you ordered
    Add {
        product_id: String,
        /// 1 to 5 stars
        #[arg(short, long)]
        rating: u8,
        #[arg(short, long)]
        comment: String,
        /// Order the product came from
        #[arg(long)]
        order: Option<String>,
    },
}

fn print_product(shop: &Storefront, product: &Product) {
    let currency = shop.config().currency;
    let mut badges = Vec::new();
    if product.is_vegetarian {
        badges.push("chay");
    }
    if product.is_featured {
        badges.push("nổi bật");
    }
    if !product.is_purchasable() {
        badges.push("hết hàng");
    }
    let badges = if badges.is_empty() {
        String::new()
    } else {
        format!(" [{}]", badges.join(", "))
    };
    println!(
        "{:<26} {:<32} {:>12}{badges}",
        product.id,
        product.name,
        money(product.price, currency)
    );
}

pub async fn products(shop: &Storefront, args: ProductsArgs) -> CliResult {
    if let Some(id) = args.id {
        let product = shop.api().get_product(&ProductId::new(id)).await?;
        print_product(shop, &product);
        if !product.description.is_empty() {
            println!("\n{}", product.description);
        }
        if let Some(rating) = product.rating {
            println!("★ {rating:.1} ({} đánh giá)", product.num_reviews);
        }
        println!("Còn lại: {}", product.stock);
        shop.recommendations().record_view(&product).await?;
        return Ok(());
    }

    let query = ProductQuery {
        page: Some(args.page),
        limit: Some(args.limit),
        category: args.category.map(CategoryId::new),
        search: args.search,
        is_vegetarian: args.vegetarian.then_some(true),
        sort: Some(ProductSort::Newest),
    };
    let page = shop.api().get_products(&query).await?;
    if page.items.is_empty() {
        println!("Không tìm thấy món nào.");
        return Ok(());
    }
    for product in &page.items {
        print_product(shop, product);
    }
    println!(
        "\nTrang {}/{} · {} món",
        page.pagination.page,
        page.pagination.total_pages.max(1),
        page.pagination.total
    );
    Ok(())
}

pub async fn categories(shop: &Storefront) -> CliResult {
    for category in shop.api().get_categories().await? {
        println!("{:<26} {}", category.id, category.name);
    }
    Ok(())
}

pub async fn banners(shop: &Storefront, position: Option<BannerPosition>) -> CliResult {
    let banners = shop.banners().visible(position).await?;
    if banners.is_empty() {
        println!("Không có banner nào đang hiển thị.");
    }
    for banner in banners {
        let link = banner.link.as_deref().unwrap_or("-");
        println!("[{}] {} → {link}", banner.position, banner.title);
    }
    Ok(())
}

pub async fn reviews(shop: &Storefront, action: ReviewsAction) -> CliResult {
    match action {
        ReviewsAction::List { product_id, page } => {
            let reviews = shop
                .reviews()
                .list(&ProductId::new(product_id), page)
                .await?;
            println!(
                "★ {:.1} trên {} đánh giá",
                reviews.summary.average, reviews.summary.count
            );
            for review in &reviews.reviews.items {
                println!(
                    "{} {}: {}",
                    "★".repeat(usize::from(review.rating)),
                    review.user_name.as_deref().unwrap_or("Khách"),
                    review.comment
                );
            }
        }
        ReviewsAction::Add {
            product_id,
            rating,
            comment,
            order,
        } => {
            let review = NewReview {
                product_id: ProductId::new(product_id),
                order_id: order.map(Into::into),
                rating,
                comment,
            };
            shop.reviews().submit(&review).await?;
            println!("Cảm ơn bạn đã đánh giá!");
        }
    }
    Ok(())
}

pub async fn recommend(shop: &Storefront, limit: usize, vegetarian: bool) -> CliResult {
    let products = shop.recommendations().recommend(limit, vegetarian).await?;
    if products.is_empty() {
        println!("Chưa có gợi ý nào cho bạn.");
    }
    for product in &products {
        print_product(shop, product);
    }
    Ok(())
}

pub async fn chat(shop: &Storefront, message: &str) -> CliResult {
    let reply = shop.chatbot().reply(message).await;
    println!("{}", reply.text);
    for product in &reply.products {
        print_product(shop, product);
    }
    Ok(())
}
