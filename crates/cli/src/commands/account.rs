//! Sign in, sign up, sign out.
#![allow(clippy::print_stdout)]

use fastbite_storefront::Storefront;
use fastbite_storefront::services::SignedIn;

use super::CliResult;

fn greet(signed_in: &SignedIn) {
    println!("Xin chào, {}!", signed_in.user.name);
    let merge = &signed_in.cart_merge;
    if merge.pushed > 0 {
        println!("Đã chuyển {} món từ giỏ hàng khách vào tài khoản.", merge.pushed);
    }
    for (product_id, reason) in &merge.failed {
        println!("Không thể chuyển {product_id}: {reason}");
    }
    if !merge.pending.is_empty() {
        println!(
            "{} món sẽ được chuyển khi kết nối lại máy chủ.",
            merge.pending.len()
        );
    }
}

pub async fn login(shop: &Storefront, email: &str, password: &str) -> CliResult {
    let signed_in = shop.auth().login(email, password).await?;
    greet(&signed_in);
    Ok(())
}

pub async fn register(
    shop: &Storefront,
    name: &str,
    email: &str,
    password: &str,
    phone: Option<&str>,
) -> CliResult {
    let signed_in = shop.auth().register(name, email, password, phone).await?;
    greet(&signed_in);
    Ok(())
}

pub async fn logout(shop: &Storefront) -> CliResult {
    shop.auth().logout().await?;
    println!("Đã đăng xuất.");
    Ok(())
}

pub fn whoami(shop: &Storefront) -> CliResult {
    match shop.auth().current_user()? {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            if let Some(phone) = &user.phone {
                println!("SĐT: {phone}");
            }
            if user.is_vegetarian {
                println!("Ăn chay: có");
            }
        }
        None => println!("Bạn chưa đăng nhập."),
    }
    Ok(())
}
