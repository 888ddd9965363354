//! Cart management and coupon quotes.
#![allow(clippy::print_stdout)]

use clap::Subcommand;
use fastbite_core::ProductId;
use fastbite_storefront::Storefront;

use super::{CliError, CliResult, money};

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart (default)
    Show,
    /// Add a product
    Add {
        product_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change a line's quantity
    Set { product_id: String, quantity: u32 },
    /// Remove a line
    Remove { product_id: String },
    /// Empty the cart
    Clear,
}

pub async fn run(shop: &Storefront, action: CartAction) -> CliResult {
    let cart = shop.cart();
    match action {
        CartAction::Show => return show(shop).await,
        CartAction::Add {
            product_id,
            quantity,
        } => {
            let product = shop.api().get_product(&ProductId::new(product_id)).await?;
            let update = cart.add(&product, quantity).await?;
            if let Some(warning) = update.warning {
                println!("{}", warning.message(&product.name));
            }
            println!("Đã thêm {} (x{}) vào giỏ.", product.name, update.quantity);
        }
        CartAction::Set {
            product_id,
            quantity,
        } => {
            let update = cart.set_quantity(&ProductId::new(product_id), quantity).await?;
            if let Some(warning) = update.warning {
                println!("{}", warning.message("Sản phẩm"));
            }
        }
        CartAction::Remove { product_id } => {
            cart.remove(&ProductId::new(product_id)).await?;
            println!("Đã xóa khỏi giỏ.");
        }
        CartAction::Clear => {
            cart.clear().await?;
            println!("Giỏ hàng đã trống.");
        }
    }
    show(shop).await
}

async fn show(shop: &Storefront) -> CliResult {
    let currency = shop.config().currency;
    let cart = shop.cart().load().await?;
    if cart.is_empty() {
        println!("Giỏ hàng của bạn đang trống.");
        return Ok(());
    }
    for item in &cart.items {
        println!(
            "{:<26} {:<32} x{:<3} {:>12}",
            item.product_id,
            item.product.name,
            item.quantity,
            money(item.line_total(), currency)
        );
    }
    println!(
        "Tạm tính ({} món): {}",
        cart.item_count(),
        money(cart.subtotal(), currency)
    );
    Ok(())
}

/// Price the current cart with a coupon.
pub async fn coupon(shop: &Storefront, code: &str) -> CliResult {
    if code.trim().is_empty() {
        return Err(CliError::Usage("Vui lòng nhập mã giảm giá.".to_string()));
    }
    let currency = shop.config().currency;
    let cart = shop.cart().load().await?;
    let quote = shop.checkout().quote(&cart, Some(code)).await?;
    let totals = quote.totals;
    println!("Tạm tính:  {}", money(totals.subtotal, currency));
    println!("Giảm giá:  -{}", money(totals.discount, currency));
    println!("Phí giao:  {}", money(totals.shipping_fee, currency));
    println!("Tổng cộng: {}", money(totals.total, currency));
    Ok(())
}
